//! Ask command - one prompt, one answer.

use std::path::Path;

use super::{app, finish, prepare};

pub(crate) async fn run(connections: Option<&Path>, id: &str, prompt: &str) -> miette::Result<()> {
    let app = app(connections)?;
    prepare(&app, id).await?;

    let result = async {
        app.load_model(id).await?;
        let answer = app.send_prompt(prompt).await;
        app.unload_model(id).await?;
        answer
    }
    .await;

    finish(&app).await;

    let answer = result.map_err(|e| miette::miette!("{}", e))?;
    println!("{}", answer);
    Ok(())
}
