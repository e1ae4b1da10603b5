use anyhow::Result;
use colored::Colorize;
use rust_i18n::t;

use crate::client::carbon::CarbonInterfaceClient;
use crate::client::cohere::CohereClient;
use crate::client::supabase::SupabaseUsageStore;
use crate::config::Settings;
use crate::footprint::prompt::PromptTemplate;
use crate::footprint::usage::{UsageStore, today};

pub struct Doctor;

impl Doctor {
    pub async fn check(settings: &Settings) -> Result<()> {
        println!("{}", t!("doctor_title").green().bold());
        println!("{}", "─".repeat(40).dimmed());

        // 1. Emissions API
        print!("• Carbon Interface ... ");
        let carbon = CarbonInterfaceClient::new(&settings.carbon)?;
        if !carbon.has_key() {
            println!("{}", t!("doctor_key_missing", key = "CARBON_API_KEY").red());
        } else {
            match carbon.ping().await {
                Ok(_) => println!("{}", "OK".green()),
                Err(e) => println!("{} ({})", "FAIL".red(), e),
            }
        }

        // 2. LLM
        print!("• Cohere ({}) ... ", settings.llm.model);
        let cohere = CohereClient::new(&settings.llm)?;
        if !cohere.has_key() {
            println!("{}", t!("doctor_key_missing", key = "COHERE_API_KEY").red());
        } else {
            match cohere.ping().await {
                Ok(_) => println!("{}", "OK".green()),
                Err(e) => println!("{} ({})", "FAIL".red(), e),
            }
        }

        // 3. Usage store
        print!("• Supabase api_usage ... ");
        match SupabaseUsageStore::from_config(&settings.supabase)? {
            None => println!("{}", t!("doctor_memory_store").yellow()),
            Some(store) => match store.today_count(today()).await {
                Ok(count) => println!(
                    "{} ({count}/{})",
                    "OK".green(),
                    settings.carbon.daily_limit
                ),
                Err(e) => println!("{} ({e:#})", "FAIL".red()),
            },
        }

        // 4. Prompt template
        print!("• Prompt template ... ");
        match &settings.llm.prompt_template_path {
            None => println!("{}", "built-in".green()),
            Some(path) => match PromptTemplate::from_file(path) {
                Ok(template) => println!(
                    "{} ({path}, {} variables)",
                    "OK".green(),
                    template.variables().len()
                ),
                Err(e) => println!("{} ({e})", "FAIL".red()),
            },
        }

        println!(
            "• Fallback factors ... {} kg/kWh, {} kg/km",
            settings.factors.fallback_kg_per_kwh, settings.factors.commute_kg_per_km
        );

        println!("\n{}", t!("doctor_done"));
        Ok(())
    }
}
