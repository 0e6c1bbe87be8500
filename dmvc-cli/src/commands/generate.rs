use std::fs;
use std::path::{Path, PathBuf};

use crate::templates::{self, Names};

/// Resource names become Rust identifiers and file names.
fn validate_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Name cannot be empty".into());
    }
    if !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return Err(format!("invalid name: \"{}\"", name));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(format!("invalid name: \"{}\"", name));
    }
    Ok(())
}

fn write_new(dir: PathBuf, file_name: String, content: String, kind: &str) -> Result<PathBuf, String> {
    fs::create_dir_all(&dir).map_err(|e| format!("failed to create directory {}: {}", dir.display(), e))?;

    let path = dir.join(file_name);
    if path.exists() {
        return Err(format!("{} already exists: {}", kind, path.display()));
    }
    fs::write(&path, content).map_err(|e| format!("failed to write {}: {}", path.display(), e))?;
    Ok(path)
}

/// Write `<base>/src/models/<snake>.rs`.
pub fn model(name: &str, base: &Path) -> Result<PathBuf, String> {
    validate_name(name)?;
    let names = Names::new(name);
    write_new(
        base.join("src").join("models"),
        format!("{}.rs", names.snake),
        templates::model(&names),
        "Model",
    )
}

/// Write `<base>/src/controllers/<snake>_controller.rs`.
pub fn controller(name: &str, base: &Path) -> Result<PathBuf, String> {
    validate_name(name)?;
    let names = Names::new(name);
    write_new(
        base.join("src").join("controllers"),
        format!("{}_controller.rs", names.snake),
        templates::controller(&names),
        "Controller",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names() {
        assert!(validate_name("widget").is_ok());
        assert!(validate_name("order-item").is_ok());
        assert!(validate_name("Line_Item2").is_ok());
    }

    #[test]
    fn invalid_names() {
        assert!(validate_name("").is_err());
        assert!(validate_name("../escape").is_err());
        assert!(validate_name("a/b").is_err());
        assert!(validate_name("-bad").is_err());
        assert!(validate_name("9lives").is_err());
        assert!(validate_name("no spaces").is_err());
    }

    #[test]
    fn creates_model_and_controller_files() {
        let tmp = tempfile::tempdir().unwrap();

        let model_path = model("widget", tmp.path()).unwrap();
        let controller_path = controller("widget", tmp.path()).unwrap();
        assert_eq!(model_path, tmp.path().join("src/models/widget.rs"));
        assert_eq!(controller_path, tmp.path().join("src/controllers/widget_controller.rs"));

        let model_content = fs::read_to_string(&model_path).unwrap();
        assert!(model_content.contains("pub struct WidgetModel;"));
        assert!(model_content.contains("FieldSpec::string(\"widget\")"));

        let controller_content = fs::read_to_string(&controller_path).unwrap();
        assert!(controller_content.contains("pub async fn register_widget_controller"));
        assert!(controller_content.contains("ControllerOptions::new(\"/widgets\")"));
        assert!(controller_content.contains("use crate::models::widget::WidgetModel;"));
    }

    #[test]
    fn dashed_name_uses_pascal_and_snake_case() {
        let tmp = tempfile::tempdir().unwrap();
        let path = model("order-item", tmp.path()).unwrap();
        assert!(path.ends_with("src/models/order_item.rs"));
        let content = fs::read_to_string(path).unwrap();
        assert!(content.contains("pub struct OrderItemModel;"));
    }

    #[test]
    fn refuses_to_overwrite() {
        let tmp = tempfile::tempdir().unwrap();
        model("widget", tmp.path()).unwrap();
        let err = model("widget", tmp.path()).unwrap_err();
        assert!(err.starts_with("Model already exists: "), "{}", err);

        controller("widget", tmp.path()).unwrap();
        let err = controller("widget", tmp.path()).unwrap_err();
        assert!(err.starts_with("Controller already exists: "), "{}", err);
    }
}
