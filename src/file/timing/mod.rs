mod smpte;
pub use smpte::*;

/// Tempo assumed until a file says otherwise: 120 beats per minute.
pub const DEFAULT_TEMPO: u32 = 500_000;

/// Division used when a file declares zero ticks per quarter note.
pub const DEFAULT_TICKS_PER_QUARTER: u16 = 480;

/// Microseconds elapsed over `ticks` at `tempo` (µs per quarter) and `division`
/// (ticks per quarter).
///
/// `None` if either the tempo or the division is zero.
#[inline]
pub fn ticks_to_micros(ticks: u64, tempo: u32, division: u16) -> Option<f64> {
    if tempo == 0 || division == 0 {
        return None;
    }
    Some(ticks as f64 * tempo as f64 / division as f64)
}

#[doc = r#"
Converts absolute ticks to microseconds across tempo changes.

Built from `(tick, tempo)` pairs. Several changes on the same tick resolve
to the last one given.
"#]
#[derive(Debug, Clone, PartialEq)]
pub struct TempoMap {
    division: u16,
    segments: Vec<TempoSegment>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct TempoSegment {
    tick: u64,
    micros: f64,
    tempo: u32,
}

impl TempoMap {
    /// Build a map starting at [`DEFAULT_TEMPO`]. Zero tempos are ignored.
    pub fn new(division: u16, changes: impl IntoIterator<Item = (u64, u32)>) -> Self {
        let division = if division == 0 {
            DEFAULT_TICKS_PER_QUARTER
        } else {
            division
        };
        let mut changes: Vec<(u64, u32)> = changes
            .into_iter()
            .filter(|(_, tempo)| *tempo > 0)
            .collect();
        // stable, so same-tick changes keep their order
        changes.sort_by_key(|(tick, _)| *tick);

        let mut segments = vec![TempoSegment {
            tick: 0,
            micros: 0.,
            tempo: DEFAULT_TEMPO,
        }];
        for (tick, tempo) in changes {
            let index = segments.len() - 1;
            let last = segments[index];
            if last.tick == tick {
                segments[index].tempo = tempo;
                continue;
            }
            let micros = last.micros + (tick - last.tick) as f64 * last.tempo as f64 / division as f64;
            segments.push(TempoSegment {
                tick,
                micros,
                tempo,
            });
        }
        Self { division, segments }
    }

    /// Microseconds from the start to `tick`
    pub fn micros_at(&self, tick: u64) -> f64 {
        let index = self.segments.partition_point(|s| s.tick <= tick);
        let segment = &self.segments[index.saturating_sub(1)];
        segment.micros
            + (tick - segment.tick) as f64 * segment.tempo as f64 / self.division as f64
    }

    /// Tempo in effect at `tick`
    pub fn tempo_at(&self, tick: u64) -> u32 {
        let index = self.segments.partition_point(|s| s.tick <= tick);
        self.segments[index.saturating_sub(1)].tempo
    }
}

#[test]
fn zero_inputs_have_no_conversion() {
    assert_eq!(ticks_to_micros(10, 0, 96), None);
    assert_eq!(ticks_to_micros(10, 500_000, 0), None);
    assert_eq!(ticks_to_micros(96, 500_000, 96), Some(500_000.));
}

#[test]
fn tempo_map_spans_changes() {
    use pretty_assertions::assert_eq;
    // 96 ticks at 0.5s, then double speed
    let map = TempoMap::new(96, [(96, 250_000), (0, 500_000)]);
    assert_eq!(map.micros_at(0), 0.);
    assert_eq!(map.micros_at(96), 500_000.);
    assert_eq!(map.micros_at(192), 750_000.);
    assert_eq!(map.tempo_at(95), 500_000);
    assert_eq!(map.tempo_at(96), 250_000);
}

#[test]
fn tempo_map_last_change_on_a_tick_wins() {
    let map = TempoMap::new(100, [(0, 1_000_000), (0, 200_000)]);
    assert_eq!(map.micros_at(100), 200_000.);
}
