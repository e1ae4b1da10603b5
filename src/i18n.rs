/// Falls back to English for locales without a translation file.
pub fn set_locale(lang: &str) {
    let available = rust_i18n::available_locales!();
    if available.iter().any(|l| *l == lang) {
        rust_i18n::set_locale(lang);
    } else {
        tracing::warn!("No translations for {lang}, using en");
        rust_i18n::set_locale("en");
    }
}
