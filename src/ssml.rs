//! SSML document builder
//!
//! Produces the markup sent to the synthesis service. The root element
//! declares the synthesis namespace plus the vendor expressiveness
//! extension; inside the voice element an optional prosody (rate)
//! wrapper nests an optional express-as (role/style) wrapper around the
//! escaped text, so both can be combined.

use crate::params::{SynthesisParams, DEFAULT_STYLE, NO_ROLE};

/// Build the SSML document for a parameter snapshot
pub fn build(params: &SynthesisParams) -> String {
    let mut parts = vec![
        format!(
            r#"<speak version="1.0" xmlns="http://www.w3.org/2001/10/synthesis" xmlns:mstts="http://www.w3.org/2001/mstts" xml:lang="{}">"#,
            params.language
        ),
        format!(r#"<voice name="{}">"#, params.voice),
    ];

    let rate_opened = params.has_rate_wrapper();
    if rate_opened {
        parts.push(format!(r#"<prosody rate="{:.2}">"#, params.rate));
    }

    let expr_opened = params.has_expression_wrapper();
    if expr_opened {
        let mut attrs = Vec::new();
        if params.role != NO_ROLE {
            attrs.push(format!(r#"role="{}""#, params.role));
        }
        if params.style != DEFAULT_STYLE {
            attrs.push(format!(r#"style="{}""#, params.style));
        }
        parts.push(format!("<mstts:express-as {}>", attrs.join(" ")));
    }

    parts.push(escape(&params.text));

    if expr_opened {
        parts.push("</mstts:express-as>".to_string());
    }
    if rate_opened {
        parts.push("</prosody>".to_string());
    }
    parts.push("</voice>".to_string());
    parts.push("</speak>".to_string());
    parts.concat()
}

/// Escape text for inclusion in XML character data
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}
