//! CLI auth command handlers.

use crate::auth::service::AuthService;
use crate::auth::session::{SessionQuery, SessionStatus};
use crate::auth::token::token_role;
use crate::error::Result;
use crate::types::RegisterRequest;

use super::{AuthCommands, Context};

pub async fn handle(ctx: &Context, command: AuthCommands) -> Result<()> {
    let auth = AuthService::new(ctx.api.clone(), ctx.cache.clone());
    match command {
        AuthCommands::OtpRequest { phone } => {
            auth.request_otp(&phone).await?;
            println!("One-time password sent to {phone}");
        }
        AuthCommands::OtpVerify { phone, otp } => {
            auth.verify_otp(&phone, &otp).await?;
            print_signed_in(ctx).await;
        }
        AuthCommands::Login { email, password } => {
            auth.login(&email, &password).await?;
            print_signed_in(ctx).await;
        }
        AuthCommands::Register(args) => {
            let request = RegisterRequest::builder()
                .phone(args.phone)
                .otp(args.otp)
                .first_name(args.first_name)
                .last_name(args.last_name)
                .school_id(args.school_id)
                .build();
            auth.register(&request).await?;
            print_signed_in(ctx).await;
        }
        AuthCommands::Status => handle_status(ctx).await,
        AuthCommands::Logout => {
            auth.logout().await;
            println!("Signed out");
        }
    }
    Ok(())
}

async fn print_signed_in(ctx: &Context) {
    match SessionQuery::new(ctx.api.clone(), ctx.cache.clone()).status().await {
        SessionStatus::Authenticated(user) => {
            println!("Signed in as {} ({})", user.full_name(), user.role);
        }
        SessionStatus::Unauthenticated => println!("Signed in"),
    }
}

async fn handle_status(ctx: &Context) {
    let Some(token) = ctx.api.store().access_token() else {
        println!("Not signed in");
        return;
    };
    match SessionQuery::new(ctx.api.clone(), ctx.cache.clone()).status().await {
        SessionStatus::Authenticated(user) => {
            println!("Signed in as {}", user.full_name());
            if let Some(email) = &user.email {
                println!("  email: {email}");
            }
            if let Some(phone) = &user.phone {
                println!("  phone: {phone}");
            }
            println!("  role:  {}", user.role);
        }
        SessionStatus::Unauthenticated => {
            let role = token_role(&token).unwrap_or_else(|| "unknown".to_string());
            println!("Stored credentials ({role}) were not accepted by the server");
        }
    }
}
