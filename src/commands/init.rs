//! Initialize a new site

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::Comet;

/// Initialize a new site in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir)?;

    let config_path = target_dir.join("_config.yml");
    if config_path.exists() {
        anyhow::bail!("{:?} already exists", config_path);
    }

    // Create default _config.yml
    let config_content = r#"# Site
title: spacetraveling
subtitle: ''
description: ''
author: ''
language: pt-br

# URL
url: http://example.com
root: /

# Directory
public_dir: public
post_dir: post

# Content source
## Point `endpoint` at your repository's document API, e.g.
## https://myrepo.cdn.example.com/api/v2
source:
  endpoint: ''
  access_token:
  document_type: posts
  page_size: 5
  timeout_secs: 30

# Comments (set `repo` to enable the widget on post pages)
comments:
  repo: ''
  issue_term: pathname
  theme: photon-dark

# Atom feed
feed: true

# Where the "exit preview" link on preview builds points to
exit_preview_path: /
"#;

    fs::write(&config_path, config_content)?;
    tracing::info!("Created: {:?}", config_path);

    Ok(())
}

/// Run the init command with an existing app instance
pub fn run(app: &Comet) -> Result<()> {
    init_site(&app.base_dir)
}
