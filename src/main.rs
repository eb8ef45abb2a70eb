mod book;
mod config;
mod image;
mod llm;
mod prompts;
mod story;
mod workflow;

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    println!("econotales - a personalized economics storybook builder");

    workflow::run().await
}
