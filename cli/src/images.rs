use crate::ProfileFile;
use anyhow::{Context, Result};
use clap::Parser;
use cloud_client::credential_bundle::parse_profile_images;
use cloud_model::constants::REDACTED;
use cloud_model::CloudImageTemplate;
use serde::Serialize;

const NO_PASSWORD: &str = "<none>";

/// Print the image templates of a profile.
#[derive(Debug, Parser)]
pub(crate) struct Images {
    #[clap(flatten)]
    profile: ProfileFile,

    /// Output the templates in JSON format.
    #[clap(long = "json")]
    json: bool,
}

/// A template as printed. The password column only says whether one is set.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageView<'a> {
    #[serde(flatten)]
    template: &'a CloudImageTemplate,
    password: &'static str,
}

impl<'a> From<&'a CloudImageTemplate> for ImageView<'a> {
    fn from(template: &'a CloudImageTemplate) -> Self {
        Self {
            template,
            password: match template.password() {
                Some(_) => REDACTED,
                None => NO_PASSWORD,
            },
        }
    }
}

impl Images {
    pub(crate) fn run(self) -> Result<()> {
        let params = self.profile.load()?;
        let images = parse_profile_images(&params).context("Unable to parse image data")?;
        let views: Vec<ImageView<'_>> = images.iter().map(ImageView::from).collect();

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&views)
                    .context("Could not create string from image templates.")?
            );
            return Ok(());
        }

        println!(
            "{:<16} {:<16} {:<12} {:<8} {:<12} {:<8} {}",
            "SOURCE", "PREFIX", "SIZE", "OS", "USERNAME", "MAX", "PASSWORD"
        );
        for view in &views {
            let t = view.template;
            println!(
                "{:<16} {:<16} {:<12} {:<8} {:<12} {:<8} {}",
                t.source_name(),
                t.vm_name_prefix(),
                t.vm_size(),
                t.os_type(),
                t.username(),
                t.max_instances()
                    .map(|max| max.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                view.password
            );
        }
        Ok(())
    }
}
