use anyhow::Result;
use codelink_core::configs::CodelinkConfig;

use crate::ConfigCommands;

pub fn execute(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Schema => {
            let schema = schemars::schema_for!(CodelinkConfig);
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
    }
    Ok(())
}
