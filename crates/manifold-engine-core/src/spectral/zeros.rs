//! Imaginary parts of the first non-trivial Riemann zeta zeros.
//!
//! These ordinates form the fixed, data-independent resonance set the
//! filter mask is keyed to. Values from Odlyzko's tables, truncated well
//! past f64 precision needs.

/// First 32 non-trivial zero ordinates on the critical line.
pub const ZETA_ZERO_IM: [f64; 32] = [
    14.134725141734693,
    21.022039638771554,
    25.010857580145688,
    30.424876125859513,
    32.935061587739190,
    37.586178158825671,
    40.918719012147495,
    43.327073280914999,
    48.005150881167159,
    49.773832477672302,
    52.970321477714460,
    56.446247697063394,
    59.347044002602353,
    60.831778524609809,
    65.112544048081606,
    67.079810529494173,
    69.546401711173979,
    72.067157674481907,
    75.704690699083933,
    77.144840068874805,
    79.337375020249367,
    82.910380854086030,
    84.735492980517050,
    87.425274613125229,
    88.809111207634929,
    92.491899270558484,
    94.651344040519886,
    95.870634228245309,
    98.831194218193692,
    101.317851005731391,
    103.725538040478339,
    105.446623052326094,
];

/// Maximum number of resonance frequencies available.
pub const MAX_ZEROS: usize = ZETA_ZERO_IM.len();
