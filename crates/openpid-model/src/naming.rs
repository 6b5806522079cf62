//! Identifier conversion for generated Rust code.
//!
//! Converts description names into snake_case / CamelCase identifiers and
//! formats integers as readable hex literals.

/// Converts a name to snake_case.
///
/// - Leading digits get an underscore prefix
/// - Punctuation and whitespace become underscores
/// - camelCase transitions get underscore separators
/// - Rust keywords get an underscore suffix
pub fn snake_case(name: &str) -> String {
    let mut result = String::new();
    if let Some(c) = name.chars().next() {
        if c.is_ascii_digit() {
            result.push('_');
        }
    }
    let mut prev = None;
    for c in name.chars() {
        if !c.is_ascii_alphanumeric() {
            if prev != Some('_') && !result.is_empty() {
                result.push('_');
            }
            prev = Some('_');
            continue;
        }
        if let Some(prev) = prev {
            if (prev.is_ascii_lowercase() || prev.is_ascii_digit()) && c.is_ascii_uppercase() {
                result.push('_');
            }
        }
        prev = Some(c);
        result.push(c.to_ascii_lowercase());
    }
    tweak_keywords(result.trim_end_matches('_')).to_string()
}

/// Converts a name to CamelCase.
pub fn camel_case(name: &str) -> String {
    let mut result = String::new();
    if let Some(c) = name.chars().next() {
        if c.is_ascii_digit() {
            result.push('_');
        }
    }
    let mut upper_next = true;
    for c in name.chars() {
        if !c.is_ascii_alphanumeric() {
            upper_next = true;
        } else {
            result.push(if upper_next {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            });
            upper_next = false;
        }
    }
    tweak_keywords(&result).to_string()
}

/// Appends an underscore to Rust keywords.
fn tweak_keywords(s: &str) -> &str {
    match s {
        "as" => "as_",
        "break" => "break_",
        "const" => "const_",
        "continue" => "continue_",
        "crate" => "crate_",
        "else" => "else_",
        "enum" => "enum_",
        "fn" => "fn_",
        "for" => "for_",
        "if" => "if_",
        "impl" => "impl_",
        "in" => "in_",
        "let" => "let_",
        "loop" => "loop_",
        "match" => "match_",
        "mod" => "mod_",
        "move" => "move_",
        "mut" => "mut_",
        "pub" => "pub_",
        "ref" => "ref_",
        "return" => "return_",
        "self" => "self_",
        "Self" => "Self_",
        "static" => "static_",
        "struct" => "struct_",
        "super" => "super_",
        "trait" => "trait_",
        "true" => "true_",
        "false" => "false_",
        "type" => "type_",
        "unsafe" => "unsafe_",
        "use" => "use_",
        "where" => "where_",
        "while" => "while_",
        "async" => "async_",
        "await" => "await_",
        "dyn" => "dyn_",
        "extern" => "extern_",
        "try" => "try_",
        "abstract" => "abstract_",
        "become" => "become_",
        "box" => "box_",
        "do" => "do_",
        "final" => "final_",
        "macro" => "macro_",
        "override" => "override_",
        "priv" => "priv_",
        "typeof" => "typeof_",
        "unsized" => "unsized_",
        "virtual" => "virtual_",
        "yield" => "yield_",
        "gen" => "gen_",
        s => s,
    }
}

/// Formats an integer as a Rust literal, hex with `_` every 4 digits above 9.
pub fn hex_const(val: u64) -> String {
    if val > 9 {
        let mut x = String::new();
        for (i, c) in format!("{val:x}").chars().rev().enumerate() {
            if i % 4 == 0 && i != 0 {
                x.push('_');
            }
            x.push(c);
        }
        "0x".to_string() + &x.chars().rev().collect::<String>()
    } else {
        format!("{val}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case() {
        assert_eq!(snake_case("MyRegister"), "my_register");
        assert_eq!(snake_case("GPIO_ODR"), "gpio_odr");
        assert_eq!(snake_case("tx data"), "tx_data");
        assert_eq!(snake_case("2ND"), "_2_nd");
        assert_eq!(snake_case("type"), "type_");
        assert_eq!(snake_case("TRY"), "try_");
        assert_eq!(snake_case("Yield"), "yield_");
        assert_eq!(snake_case("-EN-"), "en");
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("gpio_a"), "GpioA");
        assert_eq!(camel_case("USART1"), "Usart1");
        assert_eq!(camel_case("timer-2 ch"), "Timer2Ch");
    }

    #[test]
    fn test_hex_const() {
        assert_eq!(hex_const(0), "0");
        assert_eq!(hex_const(9), "9");
        assert_eq!(hex_const(10), "0xa");
        assert_eq!(hex_const(0x1234), "0x1234");
        assert_eq!(hex_const(0x4002_0000), "0x4002_0000");
    }
}
