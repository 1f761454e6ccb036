use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use squat_smile::{
    replay::{Recording, ReplayBodies, ReplayFaces},
    BoxError, Engine, FrameInfo, Render, TrackedIdentity, TrackerConfig,
};
use std::{
    collections::BTreeMap,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use structopt::StructOpt;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;

/// Logs squat counts as they change and keeps a one-line summary on a spinner.
struct LogRenderer {
    progress: Option<ProgressBar>,
    counts: BTreeMap<u32, u32>,
    status: String,
}

impl LogRenderer {
    fn new(show_progress: bool) -> Self {
        let progress = if show_progress {
            Some(
                ProgressBar::new_spinner().with_style(
                    ProgressStyle::default_spinner()
                        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
                        .template("{prefix:.bold.dim} {spinner} {wide_msg}"),
                ),
            )
        } else {
            None
        };
        Self {
            progress,
            counts: BTreeMap::new(),
            status: String::from("running"),
        }
    }

    fn finish(&self) {
        if let Some(progress) = &self.progress {
            progress.finish_and_clear();
        }
    }
}

impl Render for LogRenderer {
    fn render(
        &mut self,
        info: FrameInfo<'_>,
        identities: &BTreeMap<u32, TrackedIdentity>,
    ) -> Result<(), BoxError> {
        let status = info.status.to_string();
        if status != self.status {
            warn!(message = "status changed", frame_num = info.frame_num, status = %status);
            self.status = status;
        }

        for identity in identities.values() {
            let previous = self.counts.insert(identity.id, identity.squat_count());
            if previous != Some(identity.squat_count()) && identity.squat_count() > 0 {
                info!(
                    message = "squats",
                    id = identity.id,
                    count = identity.squat_count(),
                    at_ms = info.timestamp.as_millis() as u64
                );
            }
        }
        self.counts.retain(|id, _| identities.contains_key(id));

        if let Some(progress) = &self.progress {
            let people = identities
                .values()
                .map(|i| {
                    format!(
                        "#{} {} reps {} {:.0}° smile {:.2}{}",
                        i.id,
                        i.squat_count(),
                        i.squat_state(),
                        i.knee_angle,
                        i.smile_score,
                        if i.is_matched() { "" } else { " (lost)" },
                    )
                })
                .collect::<Vec<_>>()
                .join(" | ");
            progress.set_message(format!("frame {} [{}] {}", info.frame_num, self.status, people));
            progress.inc(1);
        }
        Ok(())
    }
}

#[derive(structopt::StructOpt)]
struct Opt {
    /// JSON-lines landmark recording to replay.
    #[structopt(parse(from_os_str))]
    recording: PathBuf,

    #[structopt(flatten)]
    tracker: TrackerConfig,

    #[structopt(short, long, default_value = "info", env = "RUST_LOG")]
    log_level: tracing_subscriber::filter::EnvFilter,

    #[structopt(short, long)]
    show_progress: bool,
}

fn main() -> Result<()> {
    let opt = Opt::from_args();

    tracing::subscriber::set_global_default(
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(opt.log_level),
    )?;

    let recording = Recording::open(&opt.recording).context("failed opening recording")?;

    let running = Arc::new(AtomicBool::new(true));
    let running_ctrl_c = running.clone();

    ctrlc::set_handler(move || {
        running_ctrl_c.store(false, Ordering::SeqCst);
    })
    .context("failed setting Ctrl-C handler")?;

    let mut engine =
        Engine::new(opt.tracker, ReplayBodies, ReplayFaces).context("failed constructing engine")?;
    let mut renderer = LogRenderer::new(opt.show_progress);

    let frames = engine
        .run(recording.timed(), &mut renderer, &running)
        .context("failed replaying recording")?;
    renderer.finish();

    let timing = engine.timing();
    let status = engine.status().clone();
    let tracker = engine.shutdown();

    let nframes = timing.frames.max(1) as f64;
    let busy = (timing.body + timing.face).as_secs_f64();
    info!(
        message = "replay finished",
        frames,
        status = %status,
        fps = if busy > 0.0 { timing.frames as f64 / busy } else { 0.0 },
        body_ms_per_frame = timing.body.as_secs_f64() * 1e3 / nframes,
        face_ms_per_frame = timing.face.as_secs_f64() * 1e3 / nframes
    );

    for identity in tracker.identities().values() {
        println!(
            "person {}: {} squats ({}, last seen {} ms)",
            identity.id,
            identity.squat_count(),
            identity.squat_state(),
            identity.last_seen.as_millis()
        );
    }

    Ok(())
}
