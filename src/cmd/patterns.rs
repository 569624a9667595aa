use std::path::Path;

use anyhow::{bail, Result};

use annotext::AnnotateConfig;

pub fn cmd_patterns(config_path: Option<&Path>) -> Result<()> {
    let config = AnnotateConfig::load(config_path)?;
    let pipeline = config.build_pipeline();

    if pipeline.is_empty() {
        println!("No patterns configured");
        return Ok(());
    }

    let mut invalid = 0;
    for (i, binding) in pipeline.bindings().iter().enumerate() {
        let pattern = binding.pattern();
        match pattern.compile() {
            Ok(_) => println!("{}. {} ✅", i + 1, pattern.name()),
            Err(e) => {
                invalid += 1;
                println!("{}. {} ❌ {e}", i + 1, pattern.name());
            }
        }
    }

    if invalid > 0 {
        bail!("{invalid} pattern(s) failed to compile");
    }

    Ok(())
}
