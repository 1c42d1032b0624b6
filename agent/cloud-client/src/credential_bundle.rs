/*!

The `credential_bundle` module turns the two image payloads of a profile into image templates. The
image list arrives in plain text; the passwords arrive through a separate secure parameter and are
merged in by source name. Nothing in here logs or echoes the password payload.

!*/

use cloud_model::constants::{PARAM_IMAGES_DATA, PARAM_PASSWORDS_DATA};
use cloud_model::{ClientParameters, CloudImageTemplate, Configuration, Password};
use log::debug;
use serde_json::Value;
use snafu::{ResultExt, Snafu};
use std::collections::{BTreeMap, HashSet};

pub type CredentialResult<T> = std::result::Result<T, CredentialError>;

/// The error returned when a profile's image payloads cannot be decoded.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CredentialError {
    #[snafu(display("Unable to parse image data: {}", source))]
    ImageData { source: serde_json::Error },

    #[snafu(display("Unable to parse image {} of the image data: {}", index, source))]
    Image {
        index: usize,
        source: cloud_model::Error,
    },

    #[snafu(display("Image data contains more than one image with source name '{}'", name))]
    DuplicateSourceName { name: String },

    /// The source error is kept out of the message: serde errors can quote the input.
    #[snafu(display("Unable to parse the secure password data"))]
    PasswordData { source: serde_json::Error },
}

/// Parse the image list and merge in the passwords.
///
/// - An absent or blank image payload yields no templates.
/// - A blank, absent or `null` password payload attaches no passwords.
/// - Images are returned in payload order; an image whose source name has no password is returned
///   without one.
pub fn parse_image_data(
    images_data: Option<&str>,
    passwords_data: Option<&str>,
) -> CredentialResult<Vec<CloudImageTemplate>> {
    let images_data = match images_data.map(str::trim).filter(|s| !s.is_empty()) {
        Some(some) => some,
        None => return Ok(Vec::new()),
    };
    let values: Vec<Value> = serde_json::from_str(images_data).context(ImageDataSnafu)?;
    let images = values
        .into_iter()
        .enumerate()
        .map(|(index, value)| CloudImageTemplate::from_value(value).context(ImageSnafu { index }))
        .collect::<CredentialResult<Vec<_>>>()?;

    let mut seen = HashSet::new();
    for image in &images {
        if !seen.insert(image.source_name()) {
            return DuplicateSourceNameSnafu {
                name: image.source_name(),
            }
            .fail();
        }
    }

    let passwords = parse_passwords(passwords_data)?;
    debug!(
        "Parsed {} image(s) and {} password(s)",
        images.len(),
        passwords.len()
    );
    Ok(images
        .into_iter()
        .map(|image| match passwords.get(image.source_name()) {
            Some(password) => {
                let password = Password::new(password.as_str());
                image.with_password(password)
            }
            None => image,
        })
        .collect())
}

/// Parse the images of a profile from its `images_data` and `secure:passwords_data` parameters.
pub fn parse_profile_images(
    params: &ClientParameters,
) -> CredentialResult<Vec<CloudImageTemplate>> {
    parse_image_data(params.get(PARAM_IMAGES_DATA), params.get(PARAM_PASSWORDS_DATA))
}

fn parse_passwords(passwords_data: Option<&str>) -> CredentialResult<BTreeMap<String, String>> {
    let passwords_data = match passwords_data.map(str::trim).filter(|s| !s.is_empty()) {
        Some(some) => some,
        None => return Ok(BTreeMap::new()),
    };
    let passwords: Option<BTreeMap<String, String>> =
        serde_json::from_str(passwords_data).context(PasswordDataSnafu)?;
    Ok(passwords.unwrap_or_default())
}

#[cfg(test)]
mod test {
    use super::*;

    const IMAGES: &str = r#"[
        {"sourceName":"webA","vmSize":"Small"},
        {"sourceName":"webB","vmSize":"Medium"},
        {"sourceName":"webC"}
    ]"#;

    fn passwords(images: &[CloudImageTemplate]) -> Vec<Option<&str>> {
        images
            .iter()
            .map(|i| i.password().map(Password::expose))
            .collect()
    }

    #[test]
    fn merges_passwords_by_source_name() {
        let images = parse_image_data(Some(IMAGES), Some(r#"{"webA":"secret1","webC":"c"}"#))
            .unwrap();
        let names: Vec<&str> = images.iter().map(|i| i.source_name()).collect();
        assert_eq!(names, vec!["webA", "webB", "webC"]);
        assert_eq!(passwords(&images), vec![Some("secret1"), None, Some("c")]);
    }

    #[test]
    fn single_image_scenario() {
        let images =
            parse_image_data(Some(r#"[{"sourceName":"webA"}]"#), Some(r#"{"webA":"secret1"}"#))
                .unwrap();
        assert_eq!(images[0].password().unwrap().expose(), "secret1");

        for map in [None, Some(""), Some("{}"), Some("null")] {
            let images = parse_image_data(Some(r#"[{"sourceName":"webA"}]"#), map).unwrap();
            assert!(images[0].password().is_none());
        }
    }

    #[test]
    fn unknown_password_keys_are_ignored() {
        let images = parse_image_data(Some(IMAGES), Some(r#"{"webZ":"z"}"#)).unwrap();
        assert_eq!(passwords(&images), vec![None, None, None]);
    }

    #[test]
    fn source_names_match_exactly() {
        let images = parse_image_data(Some(IMAGES), Some(r#"{"weba":"x","webA ":"y"}"#)).unwrap();
        assert_eq!(passwords(&images), vec![None, None, None]);
    }

    #[test]
    fn absent_image_data_is_empty() {
        assert!(parse_image_data(None, None).unwrap().is_empty());
        assert!(parse_image_data(Some(""), Some("{}")).unwrap().is_empty());
        assert!(parse_image_data(Some("  \n"), None).unwrap().is_empty());
    }

    #[test]
    fn malformed_image_data_is_an_error() {
        let e = parse_image_data(Some("this is not json"), None).unwrap_err();
        assert!(matches!(e, CredentialError::ImageData { .. }));
        let e = parse_image_data(Some(r#"{"sourceName":"webA"}"#), None).unwrap_err();
        assert!(matches!(e, CredentialError::ImageData { .. }));
        let e = parse_image_data(Some(r#"[{"sourceName":"webA"},{"sourceName":7}]"#), None)
            .unwrap_err();
        assert!(matches!(e, CredentialError::Image { index: 1, .. }));
    }

    #[test]
    fn duplicate_source_names_are_an_error() {
        let e = parse_image_data(
            Some(r#"[{"sourceName":"webA"},{"sourceName":"webA"}]"#),
            None,
        )
        .unwrap_err();
        assert!(matches!(e, CredentialError::DuplicateSourceName { name } if name == "webA"));
    }

    #[test]
    fn malformed_password_data_does_not_echo_input() {
        let e = parse_image_data(Some(IMAGES), Some(r#"{"webA": hunter2}"#)).unwrap_err();
        assert!(matches!(e, CredentialError::PasswordData { .. }));
        assert!(!e.to_string().contains("hunter2"));
    }

    #[test]
    fn profile_parameters() {
        let mut params = ClientParameters::new();
        params.insert(PARAM_IMAGES_DATA, r#"[{"sourceName":"webA"}]"#);
        params.insert(PARAM_PASSWORDS_DATA, r#"{"webA":"secret1"}"#);
        let images = parse_profile_images(&params).unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].password().unwrap().expose(), "secret1");
    }
}
