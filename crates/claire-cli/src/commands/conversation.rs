use anyhow::{Result, bail};
use claire_application::{ClairePanel, PanelView, SendOutcome};
use claire_core::model::SelectedText;

use super::Host;

/// Mounts the panel, failing with the login URL when signed out.
async fn signed_in_panel(host: &Host) -> Result<ClairePanel> {
    let panel = host.panel();
    if panel.mount().await? == PanelView::Login {
        bail!(
            "Not signed in. Open {} in a browser to sign in.",
            panel.auth().login_url()
        );
    }
    Ok(panel)
}

pub async fn whoami(host: &Host) -> Result<()> {
    let panel = host.panel();
    if !panel.auth().check_auth().await {
        println!("Not signed in. Sign in at {}", panel.auth().login_url());
        return Ok(());
    }
    match panel.auth().user().await {
        Some(user) => match user.display_name() {
            Some(name) => println!("Signed in as {}", name),
            None => println!("Signed in: {}", serde_json::to_string(&user.0)?),
        },
        None => println!("Signed in"),
    }
    Ok(())
}

pub async fn logout(host: &Host) -> Result<()> {
    host.panel().logout().await?;
    println!("Signed out");
    Ok(())
}

pub async fn projects(host: &Host, switch: Option<i64>) -> Result<()> {
    let panel = signed_in_panel(host).await?;
    if let Some(project_id) = switch {
        panel.switch_project(project_id).await?;
    }

    let current = panel.projects().current_project_id().await;
    let projects = panel.projects().projects().await;
    if projects.is_empty() {
        println!("No projects available");
    }
    for project in projects {
        let marker = if Some(project.id) == current { "*" } else { " " };
        println!("{} {:>4}  {}", marker, project.id, project.name);
    }
    Ok(())
}

pub async fn sessions(host: &Host) -> Result<()> {
    let panel = signed_in_panel(host).await?;
    let sessions = panel.history().list_sessions().await;
    let current = panel.history().current_session_id().await;

    if sessions.is_empty() {
        println!("No conversations yet");
    }
    for session in sessions {
        let marker = if current.as_deref() == Some(session.id.as_str()) {
            "*"
        } else {
            " "
        };
        println!("{} {:10}  {}  ({})", marker, session.date, session.title, session.id);
    }
    Ok(())
}

pub async fn ask(
    host: &Host,
    message: &str,
    context: Option<String>,
    url: Option<String>,
    new: bool,
) -> Result<()> {
    let panel = signed_in_panel(host).await?;
    if new {
        panel.new_session().await?;
    }

    let controller = panel.controller();
    if let Some(text) = context {
        controller
            .set_selected_text(Some(SelectedText {
                text,
                url: url.unwrap_or_default(),
                page_title: String::new(),
            }))
            .await;
    }

    panel.record_activity().await;
    match controller.send_message(message, None).await {
        SendOutcome::Replied(reply) => {
            println!("{}", reply);
            Ok(())
        }
        SendOutcome::Failed(e) => bail!("Claire could not answer: {}", e),
        SendOutcome::Rejected(reason) => bail!("Message not sent: {:?}", reason),
    }
}
