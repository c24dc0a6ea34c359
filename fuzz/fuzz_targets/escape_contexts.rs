//! Fuzz target for escaping arbitrary bytes in every context.
//!
//! The first input byte selects the source encoding. Escaping must never
//! panic and default-deny contexts must only emit their output alphabet.

#![no_main]

use contextual_escaper::{Context, Escaper, SUPPORTED_ENCODINGS};
use libfuzzer_sys::fuzz_target;

fn allowed(context: Context, ch: char) -> bool {
    if ch.is_ascii_alphanumeric() {
        return true;
    }
    match context {
        Context::Html => !matches!(ch, '<' | '>' | '"' | '\''),
        Context::HtmlAttribute => ",.-_&#;".contains(ch),
        Context::Js => ",._\\".contains(ch),
        Context::Css => "\\ ".contains(ch),
        Context::Url => "-._~%".contains(ch),
    }
}

fuzz_target!(|data: &[u8]| {
    let Some((&selector, input)) = data.split_first() else {
        return;
    };
    let label = SUPPORTED_ENCODINGS[usize::from(selector) % SUPPORTED_ENCODINGS.len()];
    let Ok(escaper) = Escaper::new(label) else {
        panic!("supported label {} was rejected", label);
    };

    for context in Context::ALL {
        let escaped = escaper.escape(context, input);
        assert!(
            escaped.chars().all(|ch| allowed(context, ch)),
            "{} emitted a forbidden character for {:?}",
            context,
            input
        );
        let _ = escaper.to_source_encoding(&escaped);
    }
});
