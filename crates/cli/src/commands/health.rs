//! `baton health`: check that the generation runtime answers.

use baton_config::BatonConfig;

pub async fn run(config: &BatonConfig) -> Result<(), Box<dyn std::error::Error>> {
    let generator = super::build_generator(config);

    println!("Runtime:  {} at {}", generator.runtime().name(), config.generation.url);
    println!("Model:    {}", config.generation.model);

    match generator.health_check().await {
        Ok(true) => {
            println!("Status:   reachable");
            Ok(())
        }
        Ok(false) => Err(format!("runtime at {} answered with an error", config.generation.url).into()),
        Err(e) => Err(format!("runtime at {} is unreachable: {e}", config.generation.url).into()),
    }
}
