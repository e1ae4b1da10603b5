use crossterm::style::{Attribute, Color};
use termimad::{MadSkin, StyledChar};

// GreenMe palette
pub const LEAF_GREEN: Color = Color::Rgb { r: 67, g: 160, b: 71 }; // #43A047
pub const LEAF_GREEN_LIGHT: Color = Color::Rgb { r: 200, g: 230, b: 201 }; // #C8E6C9
pub const SKY: Color = Color::Rgb { r: 135, g: 206, b: 235 }; // #87CEEB
pub const SOIL: Color = Color::Rgb { r: 141, g: 110, b: 99 }; // #8D6E63

/// Skin for the Markdown the model replies with.
pub fn create_skin() -> MadSkin {
    let mut skin = MadSkin::default();

    skin.bold.set_fg(LEAF_GREEN);
    skin.italic.set_fg(SKY);
    for header in skin.headers.iter_mut() {
        header.set_fg(LEAF_GREEN);
    }
    skin.headers[0].add_attr(Attribute::Bold);

    skin.inline_code.set_fg(LEAF_GREEN_LIGHT);
    skin.inline_code.set_bg(Color::Rgb { r: 40, g: 40, b: 40 });

    skin.bullet = StyledChar::from_fg_char(LEAF_GREEN, '•');
    skin.quote_mark = StyledChar::from_fg_char(SOIL, '▌');

    skin
}
