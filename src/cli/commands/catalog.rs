//! Manual entry and catalog listing commands.

use tokio::runtime::Runtime;

use super::format_duration;
use crate::catalog::Catalog;
use crate::import::parse_duration;
use crate::model::TrackRecord;

/// Arguments of the `add` command.
pub struct ManualEntry<'a> {
    pub title: &'a str,
    pub artist: &'a str,
    pub album: Option<&'a str>,
    pub duration: Option<&'a str>,
    pub genre: Option<&'a str>,
    pub actor: &'a str,
}

impl ManualEntry<'_> {
    fn to_record(&self) -> anyhow::Result<TrackRecord> {
        let duration_ms = match self.duration {
            Some(raw) => {
                let secs = parse_duration(raw)
                    .ok_or_else(|| anyhow::anyhow!("Unrecognized duration {:?} (use 334, 5:34 or 5m34s)", raw))?;
                Some(u64::from(secs) * 1000)
            }
            None => None,
        };

        Ok(TrackRecord {
            album: self.album.map(str::to_string),
            duration_ms,
            genres: self.genre.map(str::to_string).into_iter().collect(),
            ..TrackRecord::manual(self.actor, self.title, self.artist)
        })
    }
}

/// Add one song by hand.
pub fn cmd_add(rt: &Runtime, catalog: &Catalog, entry: ManualEntry<'_>) -> anyhow::Result<()> {
    let record = entry.to_record()?;

    rt.block_on(async {
        let outcome = catalog.save_track(&record).await?;
        println!("{} (id {})", outcome.message, outcome.song.id);
        println!("  {} - {}", outcome.song.artist_name, outcome.song.title);
        println!("  Signature: {}", outcome.song.signature);
        Ok::<_, anyhow::Error>(())
    })
}

/// Show one song and its sources, by id or by 40-character signature.
pub fn cmd_show(rt: &Runtime, catalog: &Catalog, key: &str) -> anyhow::Result<()> {
    rt.block_on(async {
        let song = match key.parse::<i64>() {
            Ok(id) => catalog.get_song(id).await?,
            Err(_) => catalog.find_song_by_signature(&key.to_ascii_lowercase()).await?,
        };
        let Some(song) = song else {
            anyhow::bail!("No song matches {:?}", key);
        };

        println!("{} - {} (id {})", song.artist_name, song.title, song.id);
        if let Some(album) = &song.album_title {
            println!("  Album:     {}", album);
        }
        println!("  Duration:  {}", format_duration(song.duration_sec));
        if !song.genres.is_empty() {
            println!("  Genres:    {}", song.genres.join(", "));
        }
        println!("  Signature: {}", song.signature);
        println!("  Sources:");
        for source in &song.sources {
            println!("    {}:{}", source.source, source.source_id);
        }
        Ok::<_, anyhow::Error>(())
    })
}

/// List songs, oldest first.
pub fn cmd_list(rt: &Runtime, catalog: &Catalog, limit: i64) -> anyhow::Result<()> {
    rt.block_on(async {
        let total = catalog.count_songs().await?;
        let artists = catalog.count_artists().await?;
        let songs = catalog.list_songs(limit).await?;

        println!("{} songs by {} artists in catalog (showing {}):", total, artists, songs.len());
        for song in songs {
            println!(
                "{:>6}  {} - {} [{}] ({} source{})",
                song.id,
                song.artist_name,
                song.title,
                format_duration(song.duration_sec),
                song.sources.len(),
                if song.sources.len() == 1 { "" } else { "s" }
            );
        }
        Ok::<_, anyhow::Error>(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry<'a>(duration: Option<&'a str>) -> ManualEntry<'a> {
        ManualEntry {
            title: "Song",
            artist: "Band",
            album: Some("Record"),
            duration,
            genre: Some("rock"),
            actor: "dj-7",
        }
    }

    #[test]
    fn test_manual_entry_to_record() {
        let record = entry(Some("5:34")).to_record().unwrap();
        assert_eq!(record.source, "manual");
        assert_eq!(record.source_id, "dj-7");
        assert_eq!(record.duration_secs(), Some(334));
        assert_eq!(record.album.as_deref(), Some("Record"));
        assert_eq!(record.genres, vec!["rock"]);
    }

    #[test]
    fn test_bad_duration_is_rejected() {
        assert!(entry(Some("soon")).to_record().is_err());
        assert!(entry(None).to_record().unwrap().duration_ms.is_none());
    }
}
