//! Client hydration entries (`.rstf/entries/<stem>.entry.tsx`).

use crate::conventions::{component_path, LAYOUT_COMPONENT, ROOT_DIR};

use super::GENERATED_HEADER;

/// Generates the bundler entry for one route.
///
/// The side-effect imports load every runtime module the page reads from,
/// so each one seeds itself from the embedded server data before React
/// hydrates the document.
pub fn generate_hydration_entry(route_dir: &str, deps: &[String]) -> String {
    let mut output = String::new();

    output.push_str(GENERATED_HEADER);
    output.push_str("import { hydrateRoot } from \"react-dom/client\";\n");
    output.push_str(&format!(
        "import {{ View as Layout }} from \"../../{}\";\n",
        LAYOUT_COMPONENT
    ));
    output.push_str(&format!(
        "import {{ View as Route }} from \"../../{}\";\n",
        route_dir
    ));

    output.push_str(&format!("import \"@rstf/{}\";\n", LAYOUT_COMPONENT));
    for dep in deps.iter().filter(|d| d.as_str() != ROOT_DIR) {
        output.push_str(&format!("import \"@rstf/{}\";\n", component_path(dep)));
    }

    output.push('\n');
    output.push_str("hydrateRoot(document, <Layout><Route /></Layout>);\n");

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dashboard_entry() {
        let entry = generate_hydration_entry(
            "routes/dashboard",
            &["routes/dashboard".to_string(), "shared/ui/avatar".to_string()],
        );

        assert!(entry.contains("import { hydrateRoot } from \"react-dom/client\";"));
        assert!(entry.contains("import { View as Layout } from \"../../main\";"));
        assert!(entry.contains("import { View as Route } from \"../../routes/dashboard\";"));
        assert!(entry.contains("import \"@rstf/main\";"));
        assert!(entry.contains("import \"@rstf/routes/dashboard\";"));
        assert!(entry.contains("import \"@rstf/shared/ui/avatar\";"));
        assert!(entry.contains("hydrateRoot(document, <Layout><Route /></Layout>);"));
    }

    #[test]
    fn test_entry_without_dependencies() {
        let entry = generate_hydration_entry("routes/about", &[]);
        assert_eq!(entry.matches("import \"@rstf/").count(), 1);
        assert!(entry.contains("from \"../../routes/about\""));
    }
}
