//! DJ Player - Command Line
//!
//! A headless front end for the DJ API and player.
//!
//! Usage:
//!   dj health
//!   dj random
//!   dj track <id>
//!   dj albums [page] [limit]
//!   dj album <id>
//!   dj play [id] [--seek <secs>]...
//!   dj search <query>
//!   dj artists [page] [per_page]
//!   dj artists-for <album_id>...
//!   dj photo <artist> <out_file>
//!   dj upload <tracks.json>
//!
//! Global options: --api-url <url>, --static-url <url>
//! Uploads read DJ_UPLOAD_USERNAME / DJ_UPLOAD_PASSWORD.

mod backend;

use std::path::PathBuf;

use dj_core::api::{ArtistAlbum, ArtistAlbumsQuery, DjClient, Track, UploadTrack};
use dj_core::config::DjConfig;
use dj_core::player::{Player, PlayerEvent};
use dj_core::preferences::PreferenceStore;
use dj_core::sync::{StemKind, SEEK_DEBOUNCE};
use tracing::{info, warn};

use backend::LoggingBackend;

const USAGE: &str = "usage: dj [--api-url <url>] [--static-url <url>] \
<health | random | track <id> | albums [page] [limit] | album <id> | play [id] [--seek <secs>]... \
| search <query> | artists [page] [per_page] | artists-for <album_id>... \
| photo <artist> <out_file> | upload <tracks.json>>";

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Health,
    Random,
    Track(String),
    Albums { page: u32, limit: u32 },
    Album(String),
    Play { track_id: Option<String>, seeks: Vec<f64> },
    Search(String),
    Artists(ArtistAlbumsQuery),
    Photo { artist: String, out: PathBuf },
    Upload(PathBuf),
}

#[derive(Debug, Clone, PartialEq)]
struct Args {
    api_url: Option<String>,
    static_url: Option<String>,
    command: Command,
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut api_url = None;
    let mut static_url = None;
    let mut seeks = Vec::new();
    let mut positional = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--api-url" => api_url = Some(iter.next().ok_or("--api-url needs a value")?.clone()),
            "--static-url" => {
                static_url = Some(iter.next().ok_or("--static-url needs a value")?.clone())
            }
            "--seek" => {
                let value = iter.next().ok_or("--seek needs a value")?;
                let secs = value
                    .parse::<f64>()
                    .ok()
                    .filter(|secs| secs.is_finite())
                    .ok_or_else(|| format!("invalid seek time: {}", value))?;
                seeks.push(secs);
            }
            _ => positional.push(arg.as_str()),
        }
    }

    let number = |value: Option<&&str>, default: u32| -> Result<u32, String> {
        match value {
            Some(v) => v.parse().map_err(|_| format!("invalid number: {}", v)),
            None => Ok(default),
        }
    };

    let command = match positional.as_slice() {
        ["health"] => Command::Health,
        ["random"] => Command::Random,
        ["track", id] => Command::Track(id.to_string()),
        ["albums", rest @ ..] if rest.len() <= 2 => Command::Albums {
            page: number(rest.first(), 1)?,
            limit: number(rest.get(1), 20)?,
        },
        ["album", id] => Command::Album(id.to_string()),
        ["play"] => Command::Play { track_id: None, seeks },
        ["play", id] => Command::Play {
            track_id: Some(id.to_string()),
            seeks,
        },
        ["search", query] => Command::Search(query.to_string()),
        ["artists", rest @ ..] if rest.len() <= 2 => {
            Command::Artists(ArtistAlbumsQuery::Paged {
                page: number(rest.first(), 1)?,
                per_page: number(rest.get(1), 10)?,
            })
        }
        ["artists-for", ids @ ..] if !ids.is_empty() => Command::Artists(
            ArtistAlbumsQuery::Albums(ids.iter().map(|id| id.to_string()).collect()),
        ),
        ["photo", artist, out] => Command::Photo {
            artist: artist.to_string(),
            out: PathBuf::from(out),
        },
        ["upload", file] => Command::Upload(PathBuf::from(file)),
        _ => return Err(USAGE.to_string()),
    };

    Ok(Args {
        api_url,
        static_url,
        command,
    })
}

fn print_track(track: &Track) {
    let info = &track.info;
    println!("{} - {}", info.artist, info.title);
    println!("  id:     {}", track.id);
    println!("  album:  {} ({})", info.album, info.genre);
    println!("  length: {}", dj_core::player::format_clock(info.length));
    println!("  tempo:  {:.0} BPM, key {}", info.tempo, info.key);
    println!(
        "  stems:  {}",
        if track.vocal_folder().is_some() { "instrumental + vocal" } else { "instrumental" }
    );
}

fn print_artist_albums(rows: &[ArtistAlbum]) {
    for row in rows {
        println!(
            "  {:<30} {:<40} {:>3} tracks  {}  {}",
            row.artist,
            row.album_name,
            row.track_count,
            row.genre.as_deref().unwrap_or("-"),
            row.album_id
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dj_core::logging::init();

    let raw: Vec<String> = std::env::args().skip(1).collect();
    let args = match parse_args(&raw) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{}", message);
            std::process::exit(2);
        }
    };

    let mut config = DjConfig::from_env();
    if let Some(url) = args.api_url {
        config = config.with_api_url(url);
    }
    if let Some(url) = args.static_url {
        config = config.with_static_url(url);
    }

    let mut client = DjClient::new(config.api_url.clone())?;
    if let Some(credentials) = config.upload_credentials.clone() {
        client = client.with_credentials(credentials);
    }
    let mut preferences = match &config.preferences_path {
        Some(path) => PreferenceStore::load(path)?,
        None => PreferenceStore::in_memory(),
    };

    match args.command {
        Command::Health => {
            client.health().await?;
            println!("OK");
        }
        Command::Random => {
            let anon_id = preferences.anonymous_id()?;
            print_track(&client.random_track(anon_id.as_str()).await?);
        }
        Command::Track(id) => print_track(&client.track(&id).await?),
        Command::Albums { page, limit } => {
            let listing = client.albums(page, limit).await?;
            println!("{} albums (page {})", listing.total, page);
            for album in listing.albums {
                println!("  {}  {}", album.id, album.name);
            }
        }
        Command::Album(id) => {
            let listing = client.album_tracks(&id).await?;
            for track in listing.tracks {
                println!(
                    "  {}  {:<40} {}",
                    track.id,
                    track.title,
                    dj_core::player::format_clock(track.duration)
                );
            }
        }
        Command::Play { track_id, seeks } => {
            let mut player = Player::new(config, client, LoggingBackend, preferences);
            let current = player.load_track(track_id.as_deref()).await?;
            print_track(&current.track);

            player.play()?;
            for seek in seeks {
                player.handle_event(PlayerEvent::Seeking {
                    stem: StemKind::Instrumental,
                    time_secs: seek,
                })?;
            }
            // Let the last seek settle
            tokio::time::sleep(SEEK_DEBOUNCE * 2).await;

            info!("Position {} / {}", player.elapsed_clock(), player.duration_clock());
            player.pause()?;
            player.unload();
        }
        Command::Search(query) => {
            let ids = client.search(&query).await?;
            if ids.is_empty() {
                println!("No matches for {:?}", query);
            } else {
                print_artist_albums(&client.artists_albums(&ArtistAlbumsQuery::Albums(ids)).await?);
            }
        }
        Command::Artists(query) => print_artist_albums(&client.artists_albums(&query).await?),
        Command::Photo { artist, out } => {
            let photo = client.artist_photo(&artist).await?;
            std::fs::write(&out, &photo)?;
            println!("Wrote {} bytes to {}", photo.len(), out.display());
        }
        Command::Upload(file) => {
            let tracks: Vec<UploadTrack> = serde_json::from_str(&std::fs::read_to_string(&file)?)?;
            let uploaded = client.upload_tracks(&tracks).await?;
            if uploaded.len() < tracks.len() {
                warn!("Backend created {} of {} tracks", uploaded.len(), tracks.len());
            }
            for track in uploaded {
                println!("  {}  album {}", track.id, track.album_id);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse_args(&args(&["health"])).unwrap().command, Command::Health);
        assert_eq!(parse_args(&args(&["random"])).unwrap().command, Command::Random);
        assert_eq!(
            parse_args(&args(&["track", "abc"])).unwrap().command,
            Command::Track("abc".to_string())
        );
    }

    #[test]
    fn test_parse_albums_defaults() {
        assert_eq!(
            parse_args(&args(&["albums"])).unwrap().command,
            Command::Albums { page: 1, limit: 20 }
        );
        assert_eq!(
            parse_args(&args(&["albums", "3", "5"])).unwrap().command,
            Command::Albums { page: 3, limit: 5 }
        );
        assert!(parse_args(&args(&["albums", "x"])).is_err());
    }

    #[test]
    fn test_parse_play_with_seeks_and_urls() {
        let parsed = parse_args(&args(&[
            "--api-url",
            "http://api",
            "play",
            "t1",
            "--seek",
            "12.5",
            "--seek",
            "80",
        ]))
        .unwrap();

        assert_eq!(parsed.api_url.as_deref(), Some("http://api"));
        assert_eq!(parsed.static_url, None);
        assert_eq!(
            parsed.command,
            Command::Play {
                track_id: Some("t1".to_string()),
                seeks: vec![12.5, 80.0]
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_args(&args(&[])).is_err());
        assert!(parse_args(&args(&["play", "--seek"])).is_err());
        assert!(parse_args(&args(&["play", "--seek", "soon"])).is_err());
        assert!(parse_args(&args(&["dance"])).is_err());
    }

    #[test]
    fn test_parse_rejects_non_finite_seek() {
        for value in ["NaN", "inf", "-infinity"] {
            assert!(parse_args(&args(&["play", "--seek", value])).is_err());
        }
    }

    #[test]
    fn test_parse_directory_commands() {
        assert_eq!(
            parse_args(&args(&["search", "miles"])).unwrap().command,
            Command::Search("miles".to_string())
        );
        assert_eq!(
            parse_args(&args(&["artists"])).unwrap().command,
            Command::Artists(ArtistAlbumsQuery::Paged { page: 1, per_page: 10 })
        );
        assert_eq!(
            parse_args(&args(&["artists-for", "a1", "a2"])).unwrap().command,
            Command::Artists(ArtistAlbumsQuery::Albums(vec![
                "a1".to_string(),
                "a2".to_string()
            ]))
        );
        assert!(parse_args(&args(&["artists-for"])).is_err());
        assert_eq!(
            parse_args(&args(&["photo", "Miles Davis", "miles.jpg"])).unwrap().command,
            Command::Photo {
                artist: "Miles Davis".to_string(),
                out: PathBuf::from("miles.jpg")
            }
        );
        assert_eq!(
            parse_args(&args(&["upload", "tracks.json"])).unwrap().command,
            Command::Upload(PathBuf::from("tracks.json"))
        );
    }
}
