//! Print the JSON Schema of the stack configuration file

use brender_stack::StackConfig;

fn main() -> Result<(), serde_json::Error> {
    let schema = schemars::schema_for!(StackConfig);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
