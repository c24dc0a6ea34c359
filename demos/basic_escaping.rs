//! Basic escaping example demonstrating every output context

use contextual_escaper::{Context, Escaper};
use tracing_subscriber::EnvFilter;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    println!("=== Contextual Escaper - Basic Examples ===\n");

    // Example 1: HTML body text
    example_1();

    // Example 2: Unquoted attribute value
    example_2();

    // Example 3: Inline script string
    example_3();

    // Example 4: CSS value and URL parameter
    example_4();

    // Example 5: One payload, every context
    example_5();
}

fn example_1() {
    println!("Example 1: HTML body text");
    let input = "<script>alert('xss')</script> & friends";
    println!("Input: {}\n", input);

    let escaper = Escaper::default();
    println!("Output:");
    println!("<p>{}</p>", escaper.escape_html(input));
    println!("---\n");
}

fn example_2() {
    println!("Example 2: Unquoted attribute value");
    let input = "x onmouseover=alert(1)";
    println!("Input: {}\n", input);

    let escaper = Escaper::default();
    println!("Output:");
    println!("<input value={}>", escaper.escape_html_attribute(input));
    println!("---\n");
}

fn example_3() {
    println!("Example 3: Inline script string");
    let input = "</script><script>alert(\"pwned\")</script>";
    println!("Input: {}\n", input);

    let escaper = Escaper::default();
    println!("Output:");
    println!("<script>var name = '{}';</script>", escaper.escape_js(input));
    println!("---\n");
}

fn example_4() {
    println!("Example 4: CSS value and URL parameter");
    let color = "red; background: url(javascript:alert(1))";
    let query = "rust & c++ / 日本";
    println!("Input: {} | {}\n", color, query);

    let escaper = Escaper::default();
    println!("Output:");
    println!("<div style=\"color: {}\"></div>", escaper.escape_css(color));
    println!("<a href=\"/search?q={}\">search</a>", escaper.escape_url(query));
    println!("---\n");
}

fn example_5() {
    println!("Example 5: One payload, every context");
    let input = "\"'><img src=x onerror=alert(1)>";
    println!("Input: {}\n", input);

    let escaper = Escaper::default();
    println!("Output:");
    for context in Context::ALL {
        println!("{:>15}: {}", context.name(), escaper.escape(context, input));
    }
    println!("---\n");
}
