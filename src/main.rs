use anyhow::{Result, bail};
use clap::Parser;
use clubs_notify::{
    api::{ClubsApi, CurrentUser},
    auth::{CredentialSource, EnvToken, SessionToken},
    bus::LocalEventBus,
    cli::{Args, Command},
    client::StreamClient,
    config::Config,
    coordinator::{ChannelNotifier, NotificationCoordinator},
    events::{EventSender, create_event_channel},
    formatter::OutputFormat,
    monitoring::{HealthStatus, setup_metrics},
    subscription::StreamSubscription,
    tracing_setup::setup_tracing,
    transport::HttpTransport,
    ui::{UIController, UIOptions},
};
use std::{sync::Arc, time::Duration};
use tracing::{error, info};

const UI_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_tracing(&args.log_level, args.json_logs)?;
    info!("Starting clubs-notify v{}", env!("CARGO_PKG_VERSION"));

    let config = Arc::new(Config::from_args(&args)?);

    if config.metrics.enabled {
        setup_metrics(config.metrics.port).await?;
        info!("Metrics server started on port {}", config.metrics.port);
    }

    let credentials: Arc<dyn CredentialSource> = match &config.session.token {
        Some(token) => Arc::new(SessionToken::new(Some(token.clone()))),
        None => Arc::new(EnvToken::new(config.session.token_env.clone())),
    };

    let (event_sender, event_receiver) = create_event_channel();
    let mut ui = UIController::new(
        event_receiver,
        OutputFormat::from(config.output.format.as_str()),
        UIOptions {
            colored: config.output.colored,
            quiet: config.output.quiet,
        },
    );
    let ui_task = tokio::spawn(async move { ui.run().await });

    let bus = LocalEventBus::new();
    let coordinator = NotificationCoordinator::new(
        Arc::new(ChannelNotifier::new(event_sender.clone())),
        config.session.user_id,
    );
    let local_listener = coordinator.attach(&bus);

    let outcome = match args.command.clone().unwrap_or(Command::Listen) {
        Command::Listen => {
            listen(
                &config,
                credentials,
                coordinator.clone(),
                event_sender.clone(),
            )
            .await
        }
        Command::Join { club_id } => {
            let api = clubs_api(&config, credentials, bus.clone());
            join(&config, &api, club_id).await
        }
        Command::Leave { club_id, user_id } => {
            let api = clubs_api(&config, credentials, bus.clone());
            api.leave_club(club_id, user_id)
                .await
                .map(|response| info!("Leave club {}: {}", club_id, response.message))
                .map_err(Into::into)
        }
        Command::Accept {
            club_id,
            request_id,
        } => {
            let api = clubs_api(&config, credentials, bus.clone());
            api.accept_request(club_id, request_id)
                .await
                .map(|response| {
                    info!(
                        "Accept request {} for club {}: {}",
                        request_id, club_id, response.message
                    )
                })
                .map_err(Into::into)
        }
    };

    // every sender must go away for the UI loop to finish
    local_listener.unsubscribe();
    drop(coordinator);
    drop(bus);
    drop(event_sender);
    let _ = tokio::time::timeout(UI_DRAIN_TIMEOUT, ui_task).await;

    if let Err(e) = &outcome {
        error!("clubs-notify error: {}", e);
    }
    outcome
}

async fn listen(
    config: &Config,
    credentials: Arc<dyn CredentialSource>,
    coordinator: Arc<NotificationCoordinator>,
    event_sender: EventSender,
) -> Result<()> {
    if credentials.bearer_token().is_none() {
        bail!(
            "no access token: pass --token or set {}",
            config.session.token_env
        );
    }

    let transport = Arc::new(HttpTransport::new(config.stream.connect_timeout)?);
    let client = Arc::new(StreamClient::new(
        Arc::new(config.stream.clone()),
        credentials,
        transport,
        event_sender.clone(),
    ));

    let mut subscription =
        StreamSubscription::new(client.clone(), coordinator.stream_handler(), event_sender);
    subscription.set_enabled(true);

    info!("Listening for club notifications. Press Ctrl+C to shutdown...");
    tokio::signal::ctrl_c().await?;

    let health = client.with_state(HealthStatus::from_state);
    info!("Stream health at shutdown: {}", health.to_json());

    subscription.set_enabled(false);
    Ok(())
}

fn clubs_api(config: &Config, credentials: Arc<dyn CredentialSource>, bus: LocalEventBus) -> ClubsApi {
    ClubsApi::new(
        reqwest::Client::new(),
        config.stream.base_url.clone(),
        credentials,
        bus,
    )
}

async fn join(config: &Config, api: &ClubsApi, club_id: i64) -> Result<()> {
    let user = config.session.user_id.map(|id| CurrentUser {
        id,
        name: config
            .session
            .user_name
            .clone()
            .unwrap_or_else(|| format!("User {id}")),
    });
    let response = api.join_club(club_id, user.as_ref()).await?;
    if let Some(status) = response.data.and_then(|d| d.request_status) {
        info!("Join request status: {:?}", status);
    }
    Ok(())
}
