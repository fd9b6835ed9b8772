//! Symptom vocabulary: the closed set of symptom names the classifier was
//! trained on, each bound to a fixed feature-vector position.
//!
//! Names are canonical snake-case tokens and are matched exactly. Some of the
//! built-in names carry quirks from the training data (`spotting_ urination`,
//! `fluid_overload.1`); they are kept verbatim because the model's feature
//! order depends on them.

use std::collections::HashMap;

use thiserror::Error;

/// Errors raised while building a [`SymptomVocabulary`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VocabularyError {
    #[error("symptom vocabulary is empty")]
    Empty,

    #[error("blank symptom name at index {0}")]
    BlankName(usize),

    #[error("duplicate symptom name: {0}")]
    DuplicateName(String),

    #[error("symptom '{name}' has index {index}, outside [0, {len})")]
    IndexOutOfRange {
        name: String,
        index: usize,
        len: usize,
    },

    #[error("feature index {0} is assigned to more than one symptom")]
    DuplicateIndex(usize),
}

/// Ordered, immutable mapping from symptom name to feature index.
///
/// Bijective on `[0, len)`. Iteration order is index order, which is also the
/// order search results are reported in.
#[derive(Debug, Clone)]
pub struct SymptomVocabulary {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl SymptomVocabulary {
    /// Build a vocabulary whose feature indices follow the order of `names`.
    pub fn from_names<I, S>(names: I) -> Result<Self, VocabularyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(VocabularyError::Empty);
        }

        let mut index = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(VocabularyError::BlankName(i));
            }
            if index.insert(name.clone(), i).is_some() {
                return Err(VocabularyError::DuplicateName(name.clone()));
            }
        }

        Ok(Self { names, index })
    }

    /// Build a vocabulary from explicit `(name, index)` pairs, as found in an
    /// external vocabulary file. Indices must cover `[0, N)` exactly once.
    pub fn from_indexed<I>(pairs: I) -> Result<Self, VocabularyError>
    where
        I: IntoIterator<Item = (String, usize)>,
    {
        let pairs: Vec<(String, usize)> = pairs.into_iter().collect();
        let len = pairs.len();
        if len == 0 {
            return Err(VocabularyError::Empty);
        }

        let mut slots: Vec<Option<String>> = vec![None; len];
        for (name, idx) in pairs {
            if idx >= len {
                return Err(VocabularyError::IndexOutOfRange {
                    name,
                    index: idx,
                    len,
                });
            }
            if slots[idx].is_some() {
                return Err(VocabularyError::DuplicateIndex(idx));
            }
            slots[idx] = Some(name);
        }

        // Every slot is filled: len pairs, no duplicates, all in range.
        Self::from_names(slots.into_iter().flatten())
    }

    /// The vocabulary the bundled model was trained with (132 symptoms).
    pub fn builtin() -> Self {
        Self::from_names(BUILTIN_SYMPTOMS.iter().copied())
            .unwrap_or_else(|e| unreachable!("built-in vocabulary is well-formed: {e}"))
    }

    /// Number of symptoms, which is also the feature-vector length.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Feature index of `name`, if it is a known symptom. Exact match only.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// All symptom names in feature-index order.
    pub fn all_symptoms(&self) -> &[String] {
        &self.names
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl Default for SymptomVocabulary {
    fn default() -> Self {
        Self::builtin()
    }
}

const BUILTIN_SYMPTOMS: [&str; 132] = [
    "itching",
    "skin_rash",
    "nodal_skin_eruptions",
    "continuous_sneezing",
    "shivering",
    "chills",
    "joint_pain",
    "stomach_pain",
    "acidity",
    "ulcers_on_tongue",
    "muscle_wasting",
    "vomiting",
    "burning_micturition",
    "spotting_ urination",
    "fatigue",
    "weight_gain",
    "anxiety",
    "cold_hands_and_feets",
    "mood_swings",
    "weight_loss",
    "restlessness",
    "lethargy",
    "patches_in_throat",
    "irregular_sugar_level",
    "cough",
    "high_fever",
    "sunken_eyes",
    "breathlessness",
    "sweating",
    "dehydration",
    "indigestion",
    "headache",
    "yellowish_skin",
    "dark_urine",
    "nausea",
    "loss_of_appetite",
    "pain_behind_the_eyes",
    "back_pain",
    "constipation",
    "abdominal_pain",
    "diarrhoea",
    "mild_fever",
    "yellow_urine",
    "yellowing_of_eyes",
    "acute_liver_failure",
    "fluid_overload",
    "swelling_of_stomach",
    "swelled_lymph_nodes",
    "malaise",
    "blurred_and_distorted_vision",
    "phlegm",
    "throat_irritation",
    "redness_of_eyes",
    "sinus_pressure",
    "runny_nose",
    "congestion",
    "chest_pain",
    "weakness_in_limbs",
    "fast_heart_rate",
    "pain_during_bowel_movements",
    "pain_in_anal_region",
    "bloody_stool",
    "irritation_in_anus",
    "neck_pain",
    "dizziness",
    "cramps",
    "bruising",
    "obesity",
    "swollen_legs",
    "swollen_blood_vessels",
    "puffy_face_and_eyes",
    "enlarged_thyroid",
    "brittle_nails",
    "swollen_extremeties",
    "excessive_hunger",
    "extra_marital_contacts",
    "drying_and_tingling_lips",
    "slurred_speech",
    "knee_pain",
    "hip_joint_pain",
    "muscle_weakness",
    "stiff_neck",
    "swelling_joints",
    "movement_stiffness",
    "spinning_movements",
    "loss_of_balance",
    "unsteadiness",
    "weakness_of_one_body_side",
    "loss_of_smell",
    "bladder_discomfort",
    "foul_smell_of urine",
    "continuous_feel_of_urine",
    "passage_of_gases",
    "internal_itching",
    "toxic_look_(typhos)",
    "depression",
    "irritability",
    "muscle_pain",
    "altered_sensorium",
    "red_spots_over_body",
    "belly_pain",
    "abnormal_menstruation",
    "dischromic _patches",
    "watering_from_eyes",
    "increased_appetite",
    "polyuria",
    "family_history",
    "mucoid_sputum",
    "rusty_sputum",
    "lack_of_concentration",
    "visual_disturbances",
    "receiving_blood_transfusion",
    "receiving_unsterile_injections",
    "coma",
    "stomach_bleeding",
    "distention_of_abdomen",
    "history_of_alcohol_consumption",
    "fluid_overload.1",
    "blood_in_sputum",
    "prominent_veins_on_calf",
    "palpitations",
    "painful_walking",
    "pus_filled_pimples",
    "blackheads",
    "scurring",
    "skin_peeling",
    "silver_like_dusting",
    "small_dents_in_nails",
    "inflammatory_nails",
    "blister",
    "red_sore_around_nose",
    "yellow_crust_ooze",
];
