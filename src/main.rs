use std::{process, sync::Arc};

use folio::{
    application::{
        analytics::AnalyticsBackend, content::Site, error::AppError, og_image::FontSource,
        site::SiteContext,
    },
    config,
    infra::{
        analytics::Ga4Backend,
        error::InfraError,
        fonts::GoogleFontSource,
        http::{self, HttpState},
        telemetry,
    },
};
use tokio::signal;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

const SOURCE: &str = "folio::main";

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Check(_) => run_check(settings).await,
    }
}

async fn load_site(settings: &config::Settings) -> Result<SiteContext, AppError> {
    let site = Site::load(
        &settings.content.dir,
        settings.site.locales.clone(),
        settings.site.url.as_str(),
    )
    .await?;
    Ok(SiteContext::new(site, settings.site.clone()))
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let context = load_site(&settings).await?;

    let fonts: Arc<dyn FontSource> = Arc::new(GoogleFontSource::new(&settings.og_image)?);
    let analytics = Ga4Backend::from_settings(&settings.analytics)?
        .map(|backend| Arc::new(backend) as Arc<dyn AnalyticsBackend>);
    if analytics.is_none() {
        warn!(
            target = SOURCE,
            "GA4 credentials incomplete; /api/analytics will report an error"
        );
    }

    let state = HttpState::new(
        context,
        fonts,
        settings.og_image.font_family.clone(),
        analytics,
    );
    serve_http(&settings, state).await
}

async fn run_check(settings: config::Settings) -> Result<(), AppError> {
    let context = load_site(&settings).await?;
    let site = context.site();

    println!("content: {}", settings.content.dir.display());
    for locale in context.locales().iter() {
        let marker = if context.locales().is_default(locale) {
            " (default)"
        } else {
            ""
        };
        println!(
            "{locale}{marker}: {} published posts",
            site.list_posts(locale).len()
        );
    }
    println!("total posts: {}", site.post_count());
    Ok(())
}

async fn serve_http(settings: &config::Settings, state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(target = SOURCE, addr = %settings.server.addr, "listening");

    let server = axum::serve(listener, router.into_make_service());
    let result = if settings.server.graceful_shutdown {
        server.with_graceful_shutdown(shutdown_signal()).await
    } else {
        server.await
    };

    result.map_err(|err| AppError::unexpected(format!("server error: {err}")))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(target = SOURCE, error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!(target = SOURCE, "received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!(target = SOURCE, "received terminate signal, shutting down");
            }
            Err(err) => {
                error!(target = SOURCE, error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
