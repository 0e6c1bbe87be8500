//! Embedded file templates rendered with simple `{{placeholder}}` substitution.

const MODEL_RS: &str = include_str!("model.rs.tmpl");
const CONTROLLER_RS: &str = include_str!("controller.rs.tmpl");

/// The spellings of a resource name used by the templates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Names {
    /// `WidgetPart`
    pub pascal: String,
    /// `widget_part`, used for file and function names
    pub snake: String,
    /// The name lowercased, used as the key attribute
    pub key: String,
    /// `/<lowercase>s`
    pub base_path: String,
}

impl Names {
    pub fn new(name: &str) -> Self {
        let pascal = to_pascal_case(name);
        let key = name.to_lowercase();
        Self { snake: to_snake_case(&pascal), base_path: format!("/{}s", key), pascal, key }
    }
}

/// `-` and `_` runs become word breaks; each word's first letter is uppercased
pub fn to_pascal_case(name: &str) -> String {
    name.split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

pub fn to_snake_case(pascal: &str) -> String {
    let mut out = String::with_capacity(pascal.len() + 4);
    for (i, c) in pascal.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn render(template: &str, names: &Names) -> String {
    template
        .replace("{{pascal}}", &names.pascal)
        .replace("{{snake}}", &names.snake)
        .replace("{{key}}", &names.key)
        .replace("{{base_path}}", &names.base_path)
}

pub fn model(names: &Names) -> String {
    render(MODEL_RS, names)
}

pub fn controller(names: &Names) -> String {
    render(CONTROLLER_RS, names)
}
