//! Go -> TypeScript type mapping.

/// Name the frontend gives to source types it cannot name (maps, interfaces,
/// funcs, package-qualified types).
pub const UNNAMED_TYPE: &str = "any";

/// Maps a resolved Go type name to its TypeScript equivalent.
///
/// Total over all inputs: unknown names pass through unchanged (they are
/// struct names), unnamed types become `unknown`, and `is_list` always
/// appends `[]` to the base mapping.
pub fn to_ts_type(go_type: &str, is_list: bool) -> String {
    let base = match go_type {
        "string" => "string",
        "int" | "int8" | "int16" | "int32" | "int64" | "uint" | "uint8" | "uint16" | "uint32"
        | "uint64" | "uintptr" | "float32" | "float64" | "byte" | "rune" => "number",
        "bool" => "boolean",
        "" | UNNAMED_TYPE => "unknown",
        other => other,
    };
    if is_list {
        format!("{}[]", base)
    } else {
        base.to_string()
    }
}

/// Reports whether a Go type name is a primitive the mapper collapses.
pub fn is_primitive(go_type: &str) -> bool {
    matches!(
        go_type,
        "string"
            | "bool"
            | "int"
            | "int8"
            | "int16"
            | "int32"
            | "int64"
            | "uint"
            | "uint8"
            | "uint16"
            | "uint32"
            | "uint64"
            | "uintptr"
            | "float32"
            | "float64"
            | "byte"
            | "rune"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_types() {
        assert_eq!(to_ts_type("string", false), "string");
        assert_eq!(to_ts_type("int64", false), "number");
        assert_eq!(to_ts_type("float32", false), "number");
        assert_eq!(to_ts_type("uint8", false), "number");
        assert_eq!(to_ts_type("bool", false), "boolean");
    }

    #[test]
    fn test_list_suffix() {
        assert_eq!(to_ts_type("string", true), "string[]");
        assert_eq!(to_ts_type("Post", true), "Post[]");
        assert_eq!(to_ts_type(UNNAMED_TYPE, true), "unknown[]");
    }

    #[test]
    fn test_struct_names_pass_through() {
        assert_eq!(to_ts_type("Author", false), "Author");
        assert_eq!(to_ts_type("", false), "unknown");
        assert!(!is_primitive("Author"));
        assert!(is_primitive("rune"));
    }
}
