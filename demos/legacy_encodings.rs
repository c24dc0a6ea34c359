//! Escaping input written in legacy single-byte and multi-byte encodings

use contextual_escaper::codepoint::encode_codepoint;
use contextual_escaper::{Escaper, SUPPORTED_ENCODINGS};
use tracing_subscriber::EnvFilter;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    println!("=== Contextual Escaper - Legacy Encodings ===\n");

    println!("Supported encodings: {}\n", SUPPORTED_ENCODINGS.join(", "));

    escape_in("iso-8859-1", b"Caf\xE9 <cr\xE8me>");
    escape_in("windows-1251", b"\xCF\xF0\xE8\xE2\xE5\xF2 & \xEC\xE8\xF0");
    escape_in("Shift_JIS", b"\x93\xFA\x96\x7B\x8C\xEA 'quoted'");
    escape_in("big5", b"\xA4\xA4\xA4\xE5 \"text\"");

    // Malformed bytes are recovered per context
    escape_in("utf-8", b"broken \xE4\xB8 sequence");

    // Rejected identifiers
    for label in ["", "utf-16", "klingon"] {
        match Escaper::new(label) {
            Ok(_) => println!("{:?} unexpectedly accepted", label),
            Err(err) => println!("{:?} rejected (code {}): {}", label, err.code(), err),
        }
    }
    println!();

    println!("Codepoint conversion:");
    for codepoint in [0x41, 0xE9, 0x65E5, 0x1F600, 0xD800, 0x110000] {
        match encode_codepoint(codepoint) {
            Ok(text) => println!("  U+{:04X} -> {:?} ({} bytes)", codepoint, text, text.len()),
            Err(err) => println!("  U+{:04X} -> error: {}", codepoint, err),
        }
    }
}

fn escape_in(label: &str, input: &[u8]) {
    let escaper = match Escaper::new(label) {
        Ok(escaper) => escaper,
        Err(err) => {
            eprintln!("Failed to configure {}: {}", label, err);
            return;
        }
    };

    println!("Encoding: {}", escaper.encoding());
    println!("Input bytes: {:02X?}", input);

    let html = escaper.escape_html(input);
    println!("  html:           {}", html);
    println!("  html_attribute: {}", escaper.escape_html_attribute(input));
    println!("  js:             {}", escaper.escape_js(input));
    println!("  css:            {}", escaper.escape_css(input));
    println!("  url:            {}", escaper.escape_url(input));
    println!(
        "  html re-encoded: {:02X?}",
        escaper.to_source_encoding(&html).as_ref()
    );
    println!("---\n");
}
