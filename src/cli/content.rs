//! Announcement, message and live-update command handlers.

use futures::StreamExt;

use crate::error::Result;
use crate::events::{EventStreamClient, StreamState};
use crate::resources::{AnnouncementResources, ConversationResources};
use crate::types::Announcement;

use super::{AnnouncementCommands, Context, MessageCommands};

pub async fn handle_announcements(ctx: &Context, command: AnnouncementCommands) -> Result<()> {
    let resources = AnnouncementResources::new(ctx.api.clone(), ctx.cache.clone());
    match command {
        AnnouncementCommands::Channels => {
            for channel in resources.channels().await? {
                println!("{}  {:<8} {}", channel.id, channel.channel_type, channel.name);
            }
        }
        AnnouncementCommands::List {
            channel_id,
            priority,
        } => {
            for announcement in resources.announcements(&channel_id, priority).await? {
                print_summary(&announcement);
            }
        }
        AnnouncementCommands::Show { id } => {
            let announcement = resources.announcement(&id).await?;
            print_summary(&announcement);
            println!();
            println!("{}", announcement.body);
        }
        AnnouncementCommands::Read { id } => {
            resources.mark_read(&id).await?;
            println!("Marked {id} as read");
        }
    }
    Ok(())
}

fn print_summary(a: &Announcement) {
    let marker = if a.is_read() { ' ' } else { '*' };
    println!(
        "{marker} {}  {}  [{}] {}",
        a.id,
        a.effective_at().format("%Y-%m-%d %H:%M"),
        a.priority,
        a.title
    );
}

pub async fn handle_messages(ctx: &Context, command: MessageCommands) -> Result<()> {
    let resources = ConversationResources::new(ctx.api.clone(), ctx.cache.clone());
    match command {
        MessageCommands::List => {
            for conversation in resources.conversations().await? {
                let subject = conversation.subject.as_deref().unwrap_or("(no subject)");
                println!(
                    "{}  {:>3} unread  {subject}",
                    conversation.id, conversation.unread_count
                );
            }
        }
        MessageCommands::Show { conversation_id } => {
            for message in resources.messages(&conversation_id).await? {
                println!(
                    "[{}] {}: {}",
                    message.created_at.format("%Y-%m-%d %H:%M"),
                    message.sender_id,
                    message.body
                );
            }
            resources.mark_read(&conversation_id).await?;
        }
        MessageCommands::Send {
            conversation_id,
            body,
        } => {
            let sent = resources.send_message(&conversation_id, &body).await?;
            println!("Sent {}", sent.id);
        }
    }
    Ok(())
}

/// Run the event stream and print every invalidated key until Ctrl-C or the
/// session ends.
pub async fn handle_watch(ctx: &Context) -> Result<()> {
    let client = EventStreamClient::for_api(&ctx.api, ctx.cache.clone())?;
    let handle = client.start();
    let mut states = handle.watch_state();
    let mut invalidated = Box::pin(ctx.cache.invalidation_stream());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            Some(key) = invalidated.next() => println!("invalidated {key}"),
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *states.borrow_and_update();
                eprintln!("stream: {state:?}");
                if matches!(state, StreamState::LoggedOut | StreamState::Disconnected) {
                    break;
                }
            }
        }
    }

    handle.teardown();
    handle.join().await;
    Ok(())
}
