//! Procedural composition for the looping room track.
//!
//! Decoding an audio asset is out of scope, so the track is synthesized;
//! the analyzer only cares that the signal has moving spectral energy.

/// Glicol composition (procedural music code)
pub const GLICOL_COMPOSITION: &str = r#"
~gate: speed 1.5 >> seq 48 _ 55 _48 60
~amp: ~gate >> envperc 0.002 0.12
~hz: ~gate >> mul 130.81
~bass: saw ~hz >> mul ~amp >> lpf ~cut 3.0 >> mul 0.12
~cut: sin 0.25 >> mul 900 >> add 1200
o: ~bass >> plate 0.08
"#;
