use crate::ProfileFile;
use anyhow::{ensure, Result};
use clap::Parser;
use cloud_client::credential_bundle::parse_profile_images;
use cloud_client::validation::check_client_params;
use cloud_model::constants::PARAM_MAX_INSTANCES_COUNT;
use cloud_model::TypedCloudErrorInfo;

/// Validate a profile the way the build server does before it creates a client.
#[derive(Debug, Parser)]
pub(crate) struct Check {
    #[clap(flatten)]
    profile: ProfileFile,
}

impl Check {
    pub(crate) fn run(self) -> Result<()> {
        let params = self.profile.load()?;
        let mut errors = check_client_params(&params);
        let image_count = match parse_profile_images(&params) {
            Ok(images) => images.len(),
            Err(e) => {
                errors.push(
                    TypedCloudErrorInfo::parse("Unable to parse image data")
                        .with_details(e.to_string()),
                );
                0
            }
        };

        if let Some(value) = params.get_non_empty(PARAM_MAX_INSTANCES_COUNT) {
            if value.parse::<u32>().is_err() {
                println!(
                    "warning: {} '{}' is not a number, no instances will be started",
                    PARAM_MAX_INSTANCES_COUNT, value
                );
            }
        }
        for error in &errors {
            println!("error: {}", error);
        }
        ensure!(errors.is_empty(), "Found {} problem(s)", errors.len());
        println!("Profile is valid with {} image(s)", image_count);
        Ok(())
    }
}
