//! Fuzz target: intent parsing surfaces
//!
//! Drives arbitrary text through the free-text resolver (both locales) and
//! the raw `(channel, action)` parser. Neither may panic, and a resolved
//! intent must survive a round trip through its own ids.
//!
//! cargo fuzz run fuzz_intent_text

#![no_main]

use libfuzzer_sys::fuzz_target;
use lampctl::app::commands::{Intent, IntentParams};
use lampctl::app::phrases::{Locale, resolve};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    for locale in [Locale::En, Locale::Es] {
        if let Some(intent) = resolve(text, locale) {
            let again = Intent::parse(
                intent.target.as_str(),
                intent.action.as_str(),
                IntentParams::default(),
            );
            assert_eq!(again, Ok(intent));
        }
    }

    let (channel, action) = text.split_once(' ').unwrap_or((text, ""));
    let _ = Intent::parse(channel, action, IntentParams::default());
});
