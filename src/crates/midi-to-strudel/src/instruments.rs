//! General MIDI program to Strudel sound mapping.
//!
//! Prefers the sampled instruments Strudel ships (piano, steinway, marimba,
//! ...) and falls back to the `gm_*` soundfont names.

/// The percussion channel (MIDI channel 10).
pub const DRUM_CHANNEL: u8 = 9;

pub const DEFAULT_SOUND: &str = "piano";

const GM_SOUNDS: [&str; 128] = [
    // Piano
    "piano",
    "steinway",
    "fmpiano",
    "gm_piano",
    "gm_epiano1",
    "gm_epiano2",
    "gm_harpsichord",
    "gm_clavinet",
    // Chromatic percussion
    "gm_celesta",
    "gm_glockenspiel",
    "gm_music_box",
    "vibraphone",
    "marimba",
    "xylophone_medium_ff",
    "gm_tubular_bells",
    "gm_dulcimer",
    // Organ
    "gm_drawbar_organ",
    "gm_percussive_organ",
    "gm_rock_organ",
    "gm_church_organ",
    "gm_reed_organ",
    "gm_accordion",
    "harmonica",
    "gm_bandoneon",
    // Guitar
    "gm_acoustic_guitar_nylon",
    "gm_acoustic_guitar_steel",
    "gm_electric_guitar_jazz",
    "gm_electric_guitar_clean",
    "gm_electric_guitar_muted",
    "gm_overdriven_guitar",
    "gm_distortion_guitar",
    "gm_guitar_harmonics",
    // Bass
    "gm_acoustic_bass",
    "gm_electric_bass_finger",
    "gm_electric_bass_pick",
    "gm_fretless_bass",
    "gm_slap_bass_1",
    "gm_slap_bass_2",
    "gm_synth_bass_1",
    "gm_synth_bass_2",
    // Strings
    "gm_violin",
    "gm_viola",
    "gm_cello",
    "gm_contrabass",
    "gm_tremolo_strings",
    "gm_pizzicato_strings",
    "gm_orchestral_harp",
    "timpani",
    // Ensemble
    "gm_string_ensemble_1",
    "gm_string_ensemble_2",
    "gm_synth_strings_1",
    "gm_synth_strings_2",
    "gm_choir_aahs",
    "gm_voice_oohs",
    "gm_synth_choir",
    "gm_orchestra_hit",
    // Brass
    "gm_trumpet",
    "gm_trombone",
    "gm_tuba",
    "gm_muted_trumpet",
    "gm_french_horn",
    "gm_brass_section",
    "gm_synth_brass_1",
    "gm_synth_brass_2",
    // Reed
    "gm_soprano_sax",
    "gm_alto_sax",
    "gm_tenor_sax",
    "gm_baritone_sax",
    "gm_oboe",
    "gm_english_horn",
    "gm_bassoon",
    "gm_clarinet",
    // Pipe
    "gm_piccolo",
    "gm_flute",
    "recorder_alto_sus",
    "gm_pan_flute",
    "gm_blown_bottle",
    "gm_shakuhachi",
    "gm_whistle",
    "ocarina",
    // Synth lead
    "gm_lead_1_square",
    "gm_lead_2_sawtooth",
    "gm_lead_3_calliope",
    "gm_lead_4_chiff",
    "gm_lead_5_charang",
    "gm_lead_6_voice",
    "gm_lead_7_fifths",
    "gm_lead_8_bass_lead",
    // Synth pad
    "gm_pad_new_age",
    "gm_pad_warm",
    "gm_pad_poly",
    "gm_pad_choir",
    "gm_pad_bowed",
    "gm_pad_metallic",
    "gm_pad_halo",
    "gm_pad_sweep",
    // Synth effects
    "gm_fx_rain",
    "gm_fx_soundtrack",
    "gm_fx_crystal",
    "gm_fx_atmosphere",
    "gm_fx_brightness",
    "gm_fx_goblins",
    "gm_fx_echoes",
    "gm_fx_sci_fi",
    // Ethnic
    "gm_sitar",
    "gm_banjo",
    "gm_shamisen",
    "gm_koto",
    "kalimba",
    "gm_bagpipe",
    "gm_fiddle",
    "gm_shanai",
    // Percussive
    "gm_tinkle_bell",
    "agogo",
    "gm_steel_drums",
    "woodblock",
    "gm_taiko_drum",
    "gm_melodic_tom",
    "gm_synth_drum",
    "gm_reverse_cymbal",
    // Sound effects
    "gm_guitar_fret_noise",
    "gm_breath_noise",
    "gm_seashore",
    "gm_bird_tweet",
    "gm_telephone",
    "gm_helicopter",
    "gm_applause",
    "gm_gunshot",
];

/// Map a MIDI program number (0-127) on a channel to a Strudel sound name.
///
/// The drum channel plays as piano until percussion kits are mapped.
pub fn gm_program_to_sound(program: u8, channel: u8) -> &'static str {
    if channel == DRUM_CHANNEL {
        return DEFAULT_SOUND;
    }
    GM_SOUNDS
        .get(usize::from(program))
        .copied()
        .unwrap_or(DEFAULT_SOUND)
}

/// Sound for a track: its first program change, or piano when it has none.
pub fn get_track_sound(program: Option<(u8, u8)>) -> &'static str {
    match program {
        Some((program, channel)) => gm_program_to_sound(program, channel),
        None => DEFAULT_SOUND,
    }
}
