use clap::Parser;
use innertube_dl::{
    DownloadOptions, DownloadRange, Filter, Quality, Ytdl,
    clients::ClientOrigin,
    common::{logger, types::AnyResult},
    configs::Config,
};
use tracing::{error, info};

/// Downloads a video stream through emulated InnerTube clients.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Video URL or 11 character id.
    video: String,

    /// audioandvideo, videoandaudio, audioonly, videoonly, audio or video.
    #[arg(short, long)]
    filter: Option<Filter>,

    /// highest, lowest, highestaudio, lowestaudio, highestvideo, lowestvideo,
    /// an itag or a quality label.
    #[arg(short, long, default_value = "highest")]
    quality: Quality,

    /// Byte range, `start-end` or `start-`.
    #[arg(short, long)]
    range: Option<DownloadRange>,

    /// Output file; stdout when omitted.
    #[arg(short, long)]
    output: Option<String>,

    /// Client profiles to query, overriding the config.
    #[arg(short, long, value_delimiter = ',')]
    clients: Vec<ClientOrigin>,

    /// Config file path. Defaults to config.toml, then config.default.toml.
    #[arg(long)]
    config: Option<String>,

    /// Print metadata as JSON instead of downloading.
    #[arg(long)]
    info: bool,
}

#[tokio::main]
async fn main() -> AnyResult<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    logger::init(&config);

    let mut ytdl = Ytdl::from_config(&config)?;
    if !args.clients.is_empty() {
        ytdl = ytdl.with_clients(args.clients.clone());
    }

    if args.info {
        let metadata = ytdl.get_full_info(&args.video).await?;
        println!("{}", serde_json::to_string_pretty(&metadata)?);
        return Ok(());
    }

    let options = DownloadOptions {
        filter: args.filter.clone(),
        quality: args.quality.clone(),
        range: args.range,
        ..ytdl.download_options()
    };

    let stream = match ytdl.download(&args.video, &options).await {
        Ok(stream) => stream,
        Err(e) => {
            error!("Download failed: {}", e);
            return Err(e.into());
        }
    };
    let format = stream.format().clone();

    let written = tokio::select! {
        res = write_output(stream, args.output.as_deref()) => res?,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, stopping download");
            return Ok(());
        }
    };

    info!(
        "[ {} ]: wrote {} bytes of itag {} ({})",
        format.origin, written, format.itag, format.mime_type
    );
    Ok(())
}

async fn write_output(
    stream: innertube_dl::DownloadStream,
    output: Option<&str>,
) -> innertube_dl::Result<u64> {
    match output {
        Some(path) => {
            let mut file = tokio::fs::File::create(path).await?;
            stream.write_to(&mut file).await
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stream.write_to(&mut stdout).await
        }
    }
}
