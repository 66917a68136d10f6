use crate::generation::GenerationOptions;
use crate::media::MediaTokens;
use crate::scene::SceneGraph;
use crate::scene_digest::scene_checksum;
use anyhow::Result;

/// Outcome of the last recording. `should_reuse` stores it with the
/// checksum of the scene being recorded; the finalize outcome later fills
/// in the tokens under that same checksum.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub scheme_checksum: String,
    pub media_tokens: Option<MediaTokens>,
    pub was_successful: bool,
}

/// Content-addressed cache over the previous recording. Holds at most one
/// entry; the editor only ever needs "is this re-render identical to the
/// last one".
#[derive(Default)]
pub struct RenderCache {
    entry: Option<CacheEntry>,
    last_preprocessing: Option<bool>,
}

impl RenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decides whether the previous recording can be reused for the current
    /// scene and options. The preprocessing toggle is compared first so a
    /// flipped toggle skips digest serialization entirely. A reuse decision
    /// mutates nothing, so repeated calls over unchanged inputs agree.
    pub fn should_reuse(&mut self, scene: &SceneGraph, options: &GenerationOptions) -> Result<bool> {
        if let Some(last) = self.last_preprocessing {
            if last != options.engine_preprocessing {
                eprintln!("[cache] preprocessing toggle changed, forcing re-render");
                self.last_preprocessing = Some(options.engine_preprocessing);
                self.entry = None;
                return Ok(false);
            }
        } else {
            self.last_preprocessing = Some(options.engine_preprocessing);
        }

        let checksum = scene_checksum(scene, options)?;
        match &self.entry {
            Some(entry) if entry.scheme_checksum == checksum && entry.was_successful => {
                eprintln!("[cache] hit for checksum {}", &checksum[..8.min(checksum.len())]);
                Ok(true)
            }
            Some(entry) if entry.scheme_checksum == checksum => {
                eprintln!("[cache] checksum matches a failed run, re-rendering");
                Ok(false)
            }
            _ => {
                // Store the in-flight checksum as a not-yet-successful entry
                // so a failure can land on it without recomputing.
                self.entry = Some(CacheEntry {
                    scheme_checksum: checksum,
                    media_tokens: None,
                    was_successful: false,
                });
                Ok(false)
            }
        }
    }

    /// Tokens of the reusable entry, if the last `should_reuse` said yes.
    pub fn reusable_tokens(&self) -> Option<&MediaTokens> {
        match &self.entry {
            Some(entry) if entry.was_successful => entry.media_tokens.as_ref(),
            _ => None,
        }
    }

    /// Completes the entry `should_reuse` stored for the run that just
    /// finished. The checksum is never recomputed here: the scene may have
    /// been edited while the finalize was in flight, and the tokens belong
    /// to the scene that was actually recorded.
    pub fn record_success(&mut self, tokens: MediaTokens) {
        match &mut self.entry {
            Some(entry) => {
                entry.media_tokens = Some(tokens);
                entry.was_successful = true;
            }
            None => eprintln!("[cache] no in-flight entry to complete"),
        }
    }

    /// Marks the in-flight entry failed without touching its checksum. Also
    /// used when an enqueue of a cached result fails after the fact.
    pub fn record_failure(&mut self) {
        if let Some(entry) = &mut self.entry {
            entry.media_tokens = None;
            entry.was_successful = false;
        }
    }

    pub fn entry(&self) -> Option<&CacheEntry> {
        self.entry.as_ref()
    }
}
