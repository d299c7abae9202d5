//! Submitted post and comment payloads and their field validation.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::base::store::KvStore;
use crate::config::{IMAGE_UPLOAD_DIR, MAX_COMMENT_LENGTH, MAX_POST_LENGTH};
use crate::groups;
use crate::posts::filter_post_content;

pub type FormErrors = BTreeMap<&'static str, Vec<String>>;

const REQUIRED: &str = "This field is required.";
const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";
const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

fn too_long(max: usize, got: usize) -> String {
    format!("Ensure this value has at most {} characters (it has {}).", max, got)
}

fn blank_to_none(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Checks the text as it will be stored: markup that sanitizes away counts
/// as blank. Returns the trimmed submission.
fn check_text(errors: &mut FormErrors, text: &str, max: usize) -> String {
    let text = text.trim();
    let rendered = filter_post_content(text);
    let rendered = rendered.trim();
    let len = rendered.chars().count();
    if rendered.is_empty() {
        errors.entry("text").or_default().push(REQUIRED.to_string());
    } else if len > max {
        errors.entry("text").or_default().push(too_long(max, len));
    }
    text.to_string()
}

#[derive(Serialize, Deserialize, Default, Debug, Clone)]
#[serde(default)]
pub struct PostForm {
    pub text: String,
    /// Group id; blank means no group.
    pub group: Option<String>,
    /// Uploaded file name; only its type is checked.
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CleanedPost {
    pub text: String,
    pub group_id: Option<String>,
    pub image: Option<String>,
}

impl PostForm {
    pub fn validate(
        &self,
        store: &impl KvStore,
    ) -> anyhow::Result<Result<CleanedPost, FormErrors>> {
        let mut errors = FormErrors::new();
        let text = check_text(&mut errors, &self.text, MAX_POST_LENGTH);

        let group_id = match blank_to_none(&self.group) {
            Some(id) if groups::get_group(store, id)?.is_some() => Some(id.to_string()),
            Some(_) => {
                errors.entry("group").or_default().push(INVALID_CHOICE.to_string());
                None
            }
            None => None,
        };

        let image = match blank_to_none(&self.image) {
            Some(name) => match stored_image_name(name) {
                Some(stored) => Some(stored),
                None => {
                    errors.entry("image").or_default().push(INVALID_IMAGE.to_string());
                    None
                }
            },
            None => None,
        };

        if errors.is_empty() {
            Ok(Ok(CleanedPost { text, group_id, image }))
        } else {
            Ok(Err(errors))
        }
    }

    /// The payload echoed back with its errors.
    pub fn with_errors(&self, errors: FormErrors) -> serde_json::Value {
        serde_json::json!({ "form": self, "errors": errors })
    }
}

/// Maps an uploaded file name into the upload directory, or `None` when the
/// name does not look like an image.
pub fn stored_image_name(name: &str) -> Option<String> {
    let file_name = Path::new(name).file_name()?.to_str()?;
    let mime = mime_guess::from_path(file_name).first()?;
    if mime.type_() != mime_guess::mime::IMAGE {
        return None;
    }
    Some(format!("{}{}", IMAGE_UPLOAD_DIR, file_name))
}

#[derive(Serialize, Deserialize, Default, Debug, Clone)]
#[serde(default)]
pub struct CommentForm {
    pub text: String,
}

impl CommentForm {
    pub fn validate(&self) -> Result<String, FormErrors> {
        let mut errors = FormErrors::new();
        let text = check_text(&mut errors, &self.text, MAX_COMMENT_LENGTH);
        if errors.is_empty() {
            Ok(text)
        } else {
            Err(errors)
        }
    }
}
