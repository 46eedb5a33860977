//! Free-text intent resolution.
//!
//! Recognised speech or typed text is matched against static per-locale
//! tables:
//!
//! 1. **Idioms** — whole phrases that map straight to an intent
//!    ("lights out", "sound the alarm").
//! 2. **Keywords** — otherwise exactly one target word and one action word
//!    must appear; the longest matching action word wins, so "turn off"
//!    beats "off" and "on" never shadows "turn on".
//!
//! Matching is on whole words after lowercasing and stripping punctuation.
//! Text that names two different targets is treated as unrecognised rather
//! than guessed at.

use serde::{Deserialize, Serialize};

use super::commands::{Action, Intent, Target};
use crate::drivers::channel::LedColour;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Es,
}

impl Locale {
    pub fn parse(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "en" | "en-us" | "en-gb" => Some(Self::En),
            "es" | "es-es" | "es-mx" => Some(Self::Es),
            _ => None,
        }
    }
}

struct Table {
    idioms: &'static [(&'static str, Target, Action)],
    targets: &'static [(&'static str, Target)],
    actions: &'static [(&'static str, Action)],
}

const RED: Target = Target::Led(LedColour::Red);
const BLUE: Target = Target::Led(LedColour::Blue);
const WHITE: Target = Target::Led(LedColour::White);
const GREEN: Target = Target::Led(LedColour::Green);

static EN: Table = Table {
    idioms: &[
        ("lights out", Target::All, Action::Off),
        ("all lights on", Target::All, Action::On),
        ("sound the alarm", Target::Buzzer, Action::Pulse),
        ("beep", Target::Buzzer, Action::Pulse),
        ("party mode", Target::All, Action::Blink),
    ],
    targets: &[
        ("red", RED),
        ("blue", BLUE),
        ("white", WHITE),
        ("green", GREEN),
        ("all", Target::All),
        ("everything", Target::All),
        ("lights", Target::All),
        ("buzzer", Target::Buzzer),
        ("alarm", Target::Buzzer),
    ],
    actions: &[
        ("turn on", Action::On),
        ("switch on", Action::On),
        ("on", Action::On),
        ("turn off", Action::Off),
        ("switch off", Action::Off),
        ("off", Action::Off),
        ("toggle", Action::Toggle),
        ("flip", Action::Toggle),
        ("blink", Action::Blink),
        ("flash", Action::Blink),
        ("pulse", Action::Pulse),
        ("buzz", Action::Pulse),
    ],
};

static ES: Table = Table {
    idioms: &[
        ("apaga todo", Target::All, Action::Off),
        ("enciende todo", Target::All, Action::On),
        ("suena la alarma", Target::Buzzer, Action::Pulse),
        ("pita", Target::Buzzer, Action::Pulse),
        ("modo fiesta", Target::All, Action::Blink),
    ],
    targets: &[
        ("roja", RED),
        ("rojo", RED),
        ("azul", BLUE),
        ("blanca", WHITE),
        ("blanco", WHITE),
        ("verde", GREEN),
        ("todas", Target::All),
        ("todo", Target::All),
        ("luces", Target::All),
        ("zumbador", Target::Buzzer),
        ("alarma", Target::Buzzer),
    ],
    actions: &[
        ("enciende", Action::On),
        ("encender", Action::On),
        ("prende", Action::On),
        ("apaga", Action::Off),
        ("apagar", Action::Off),
        ("alterna", Action::Toggle),
        ("cambia", Action::Toggle),
        ("parpadea", Action::Blink),
        ("parpadear", Action::Blink),
        ("pulsa", Action::Pulse),
    ],
};

fn table(locale: Locale) -> &'static Table {
    match locale {
        Locale::En => &EN,
        Locale::Es => &ES,
    }
}

/// Lowercase, turn punctuation into spaces and pad with single spaces so
/// whole-word phrases can be found with a plain substring search.
fn normalise(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push(' ');
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        out.push_str(&word.to_lowercase());
        out.push(' ');
    }
    out
}

fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    haystack.contains(&format!(" {phrase} "))
}

/// Resolve free text to an intent, or `None` if nothing in the locale's
/// tables matches unambiguously.
pub fn resolve(text: &str, locale: Locale) -> Option<Intent> {
    let table = table(locale);
    let text = normalise(text);

    if let Some((_, target, action)) = table
        .idioms
        .iter()
        .filter(|(p, _, _)| contains_phrase(&text, p))
        .max_by_key(|(p, _, _)| p.len())
    {
        return Some(Intent::new(*target, *action));
    }

    let mut target = None;
    for (word, t) in table.targets {
        if contains_phrase(&text, word) {
            match target {
                None => target = Some(*t),
                Some(seen) if seen == *t => {}
                Some(_) => return None,
            }
        }
    }

    let action = table
        .actions
        .iter()
        .filter(|(p, _)| contains_phrase(&text, p))
        .max_by_key(|(p, _)| p.len())
        .map(|(_, a)| *a)?;

    Some(Intent::new(target?, action))
}
