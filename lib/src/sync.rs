use crate::catalog::{DestinationCatalog, SourceCatalog};
use crate::error::SyncError;
use crate::importer::{ImportOptions, ImportReport, Importer};
use crate::playlist::{add_tracks_in_batches, ADD_BATCH_SIZE};

/// Settings for one sync run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    pub playlist_name: String,
    /// Only favorites by these artists are imported.
    pub allow_list: Vec<String>,
    /// Resolve everything but leave the playlist untouched.
    pub dry_run: bool,
    pub add_batch_size: usize,
    pub import: ImportOptions,
}

impl SyncOptions {
    pub fn new(playlist_name: impl Into<String>, allow_list: Vec<String>) -> Self {
        Self {
            playlist_name: playlist_name.into(),
            allow_list,
            dry_run: false,
            add_batch_size: ADD_BATCH_SIZE,
            import: ImportOptions::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub report: ImportReport,
    /// Number of add requests sent to the destination.
    pub add_calls: usize,
    /// Whether the playlist was modified.
    pub applied: bool,
}

/// Import favorites into the configured playlist.
pub async fn run_sync<S, D>(
    source: &S,
    destination: &D,
    options: &SyncOptions,
) -> Result<SyncOutcome, SyncError>
where
    S: SourceCatalog + ?Sized,
    D: DestinationCatalog + ?Sized,
{
    if options.add_batch_size == 0 {
        return Err(SyncError::InvalidConfig(
            "add batch size must be positive".to_string(),
        ));
    }

    let importer = Importer::new(source, destination, options.import.clone());
    let report = importer
        .import(&options.playlist_name, &options.allow_list)
        .await?;
    report.log_summary();

    if report.tracks.is_empty() {
        log::warn!("No tracks found to import.");
        return Ok(SyncOutcome {
            report,
            add_calls: 0,
            applied: false,
        });
    }

    if options.dry_run {
        log::warn!(
            "Dry run: ({}) tracks were not added to [{}].",
            report.added(),
            options.playlist_name
        );
        return Ok(SyncOutcome {
            report,
            add_calls: 0,
            applied: false,
        });
    }

    for track in &report.tracks {
        log::debug!("Adding: {} => [{}]", track.track, track.id);
    }

    let add_calls = add_tracks_in_batches(
        destination,
        &report.user_id,
        &report.playlist_id,
        &report.track_ids(),
        options.add_batch_size,
    )
    .await?;

    log::info!(
        "Added ({}) tracks to [{}] in ({add_calls}) requests.",
        report.added(),
        options.playlist_name
    );

    Ok(SyncOutcome {
        report,
        add_calls,
        applied: true,
    })
}
