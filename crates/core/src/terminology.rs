//! Curated terminology tables.
//!
//! These are the fixed, process-wide mappings the resolver matches against:
//! biomarker aliases to LOINC codes, condition classes to SNOMED codes /
//! ICD-10 prefixes / synonym terms / parent classes, and medication classes
//! to RxNorm codes and generic-plus-brand synonyms. The set is curated for
//! cardiometabolic literature; it is not a general terminology service.
//!
//! All tables are immutable statics, safe to share across concurrent
//! requests. Lookups are case-insensitive over class names and aliases.

use std::collections::HashMap;
use std::sync::LazyLock;

/// One biomarker the engine can locate in a patient's observations.
///
/// `loinc_codes` are in priority order: the first code present in the
/// snapshot wins.
#[derive(Debug)]
pub struct BiomarkerSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub loinc_codes: &'static [&'static str],
}

/// A curated bucket of equivalent codes and terms for one clinical concept.
///
/// `parents` name broader classes that satisfy this one transitively: a
/// patient coded with a parent-class diagnosis counts as matching this class
/// when no direct match exists.
#[derive(Debug)]
pub struct ConditionClass {
    pub name: &'static str,
    pub snomed_codes: &'static [&'static str],
    /// ICD-10 entries are hierarchical; these match exactly or as a prefix
    /// of the patient's code ("I25" covers "I25.110").
    pub icd10_prefixes: &'static [&'static str],
    pub synonyms: &'static [&'static str],
    pub parents: &'static [&'static str],
}

/// A curated medication bucket. No parent hierarchy; drug classes are flat.
#[derive(Debug)]
pub struct MedicationClass {
    pub name: &'static str,
    pub rxnorm_codes: &'static [&'static str],
    pub synonyms: &'static [&'static str],
}

pub static BIOMARKERS: &[BiomarkerSpec] = &[
    BiomarkerSpec {
        name: "LDL cholesterol",
        aliases: &[
            "ldl cholesterol",
            "ldl-c",
            "ldl",
            "low-density lipoprotein cholesterol",
            "low density lipoprotein",
        ],
        loinc_codes: &["18262-6", "13457-7", "2089-1"],
    },
    BiomarkerSpec {
        name: "HDL cholesterol",
        aliases: &[
            "hdl cholesterol",
            "hdl-c",
            "hdl",
            "high-density lipoprotein cholesterol",
        ],
        loinc_codes: &["2085-9"],
    },
    BiomarkerSpec {
        name: "total cholesterol",
        aliases: &["total cholesterol", "cholesterol"],
        loinc_codes: &["2093-3"],
    },
    BiomarkerSpec {
        name: "triglycerides",
        aliases: &["triglycerides", "triglyceride"],
        loinc_codes: &["2571-8"],
    },
    BiomarkerSpec {
        name: "HbA1c",
        aliases: &[
            "hba1c",
            "hemoglobin a1c",
            "glycated hemoglobin",
            "glycohemoglobin",
            "a1c",
        ],
        loinc_codes: &["4548-4", "17856-6"],
    },
    BiomarkerSpec {
        name: "fasting glucose",
        aliases: &["fasting glucose", "fasting plasma glucose", "fpg", "glucose"],
        loinc_codes: &["1558-6", "2345-7"],
    },
    BiomarkerSpec {
        name: "hs-CRP",
        aliases: &[
            "hs-crp",
            "hscrp",
            "high-sensitivity c-reactive protein",
            "c-reactive protein",
            "crp",
        ],
        loinc_codes: &["30522-7", "1988-5"],
    },
    BiomarkerSpec {
        name: "systolic blood pressure",
        aliases: &["systolic blood pressure", "sbp"],
        loinc_codes: &["8480-6"],
    },
    BiomarkerSpec {
        name: "diastolic blood pressure",
        aliases: &["diastolic blood pressure", "dbp"],
        loinc_codes: &["8462-4"],
    },
    BiomarkerSpec {
        name: "eGFR",
        aliases: &["egfr", "estimated glomerular filtration rate", "gfr"],
        loinc_codes: &["98979-8", "33914-3", "62238-1"],
    },
    BiomarkerSpec {
        name: "serum creatinine",
        aliases: &["serum creatinine", "creatinine"],
        loinc_codes: &["2160-0"],
    },
    BiomarkerSpec {
        name: "BMI",
        aliases: &["bmi", "body mass index"],
        loinc_codes: &["39156-5"],
    },
    BiomarkerSpec {
        name: "NT-proBNP",
        aliases: &[
            "nt-probnp",
            "n-terminal pro b-type natriuretic peptide",
            "bnp",
        ],
        loinc_codes: &["33762-6", "30934-4"],
    },
    BiomarkerSpec {
        name: "troponin",
        aliases: &["troponin", "high-sensitivity troponin", "troponin t"],
        loinc_codes: &["67151-1", "6598-7"],
    },
    BiomarkerSpec {
        name: "Lp(a)",
        aliases: &["lp(a)", "lipoprotein(a)", "lipoprotein a"],
        loinc_codes: &["10835-7"],
    },
    BiomarkerSpec {
        name: "ApoB",
        aliases: &["apob", "apolipoprotein b"],
        loinc_codes: &["1884-6"],
    },
];

pub static CONDITION_CLASSES: &[ConditionClass] = &[
    ConditionClass {
        name: "atherosclerotic cardiovascular disease",
        snomed_codes: &[
            "53741008", "22298006", "230690007", "399957001", "443502000",
        ],
        icd10_prefixes: &[
            "I20", "I21", "I22", "I24", "I25", "I63", "I65", "I66", "I70", "I73",
        ],
        synonyms: &[
            "ascvd",
            "atherosclerosis",
            "atherosclerotic",
            "cardiovascular disease",
        ],
        parents: &[],
    },
    ConditionClass {
        name: "coronary artery disease",
        snomed_codes: &["53741008", "414024009"],
        icd10_prefixes: &["I25"],
        synonyms: &[
            "coronary artery disease",
            "cad",
            "coronary heart disease",
            "ischemic heart disease",
            "coronary arteriosclerosis",
        ],
        parents: &["atherosclerotic cardiovascular disease"],
    },
    ConditionClass {
        name: "myocardial infarction",
        snomed_codes: &["22298006", "399211009", "401303003", "401314000"],
        icd10_prefixes: &["I21", "I22", "I25.2"],
        synonyms: &[
            "myocardial infarction",
            "prior myocardial infarction",
            "history of myocardial infarction",
            "heart attack",
            "stemi",
            "nstemi",
        ],
        parents: &["coronary artery disease", "atherosclerotic cardiovascular disease"],
    },
    ConditionClass {
        name: "stroke",
        snomed_codes: &["230690007", "266257000"],
        icd10_prefixes: &["I63", "I64"],
        synonyms: &["stroke", "cerebrovascular accident", "cva", "ischemic stroke"],
        parents: &["atherosclerotic cardiovascular disease"],
    },
    ConditionClass {
        name: "peripheral artery disease",
        snomed_codes: &["399957001", "840580004"],
        icd10_prefixes: &["I70.2", "I73"],
        synonyms: &[
            "peripheral artery disease",
            "peripheral arterial disease",
            "peripheral vascular disease",
            "claudication",
        ],
        parents: &["atherosclerotic cardiovascular disease"],
    },
    ConditionClass {
        name: "heart failure",
        snomed_codes: &["84114007", "42343007"],
        icd10_prefixes: &["I50"],
        synonyms: &["heart failure", "congestive heart failure", "chf", "cardiac failure"],
        parents: &[],
    },
    ConditionClass {
        name: "heart failure with reduced ejection fraction",
        snomed_codes: &["703272007"],
        icd10_prefixes: &["I50.2"],
        synonyms: &[
            "heart failure with reduced ejection fraction",
            "hfref",
            "systolic heart failure",
        ],
        parents: &["heart failure"],
    },
    ConditionClass {
        name: "hypertension",
        snomed_codes: &["38341003", "59621000"],
        icd10_prefixes: &["I10", "I11"],
        synonyms: &["hypertension", "essential hypertension", "high blood pressure"],
        parents: &[],
    },
    ConditionClass {
        name: "diabetes mellitus",
        snomed_codes: &["73211009"],
        icd10_prefixes: &["E08", "E09", "E10", "E11", "E13"],
        synonyms: &["diabetes mellitus", "diabetes"],
        parents: &[],
    },
    ConditionClass {
        name: "type 2 diabetes",
        snomed_codes: &["44054006"],
        icd10_prefixes: &["E11"],
        synonyms: &[
            "type 2 diabetes",
            "type 2 diabetes mellitus",
            "diabetes mellitus type 2",
            "t2dm",
            "type ii diabetes",
        ],
        parents: &["diabetes mellitus"],
    },
    ConditionClass {
        name: "chronic kidney disease",
        snomed_codes: &["709044004", "431855005", "433144002"],
        icd10_prefixes: &["N18"],
        synonyms: &[
            "chronic kidney disease",
            "ckd",
            "chronic renal failure",
            "renal insufficiency",
        ],
        parents: &[],
    },
    ConditionClass {
        name: "atrial fibrillation",
        snomed_codes: &["49436004"],
        icd10_prefixes: &["I48"],
        synonyms: &["atrial fibrillation", "afib"],
        parents: &[],
    },
    ConditionClass {
        name: "hyperlipidemia",
        snomed_codes: &["55822004", "267434003"],
        icd10_prefixes: &["E78"],
        synonyms: &[
            "hyperlipidemia",
            "dyslipidemia",
            "hypercholesterolemia",
            "high cholesterol",
        ],
        parents: &[],
    },
    ConditionClass {
        name: "obesity",
        snomed_codes: &["414916001"],
        icd10_prefixes: &["E66"],
        synonyms: &["obesity", "obese"],
        parents: &[],
    },
];

pub static MEDICATION_CLASSES: &[MedicationClass] = &[
    MedicationClass {
        name: "statin",
        rxnorm_codes: &["83367", "36567", "301542", "42463", "6472", "861634"],
        synonyms: &[
            "statin",
            "atorvastatin",
            "rosuvastatin",
            "simvastatin",
            "pravastatin",
            "lovastatin",
            "pitavastatin",
            "lipitor",
            "crestor",
            "zocor",
            "pravachol",
            "livalo",
        ],
    },
    MedicationClass {
        name: "ezetimibe",
        rxnorm_codes: &["341248"],
        synonyms: &["ezetimibe", "zetia"],
    },
    MedicationClass {
        name: "pcsk9 inhibitor",
        rxnorm_codes: &["1659152", "1665862"],
        synonyms: &[
            "pcsk9 inhibitor",
            "evolocumab",
            "alirocumab",
            "repatha",
            "praluent",
        ],
    },
    MedicationClass {
        name: "metformin",
        rxnorm_codes: &["6809"],
        synonyms: &["metformin", "glucophage"],
    },
    MedicationClass {
        name: "glp-1 receptor agonist",
        rxnorm_codes: &["1991302", "475968", "1598264"],
        synonyms: &[
            "glp-1 receptor agonist",
            "glp-1",
            "glp1",
            "semaglutide",
            "liraglutide",
            "dulaglutide",
            "exenatide",
            "ozempic",
            "wegovy",
            "rybelsus",
            "victoza",
            "trulicity",
        ],
    },
    MedicationClass {
        name: "sglt2 inhibitor",
        rxnorm_codes: &["1545653", "1488564", "1373458"],
        synonyms: &[
            "sglt2 inhibitor",
            "sglt2",
            "empagliflozin",
            "dapagliflozin",
            "canagliflozin",
            "jardiance",
            "farxiga",
            "invokana",
        ],
    },
    MedicationClass {
        name: "insulin",
        rxnorm_codes: &["274783", "311041", "261551"],
        synonyms: &[
            "insulin",
            "insulin glargine",
            "insulin lispro",
            "insulin aspart",
            "lantus",
            "humalog",
            "novolog",
            "basaglar",
        ],
    },
    MedicationClass {
        name: "ace inhibitor",
        rxnorm_codes: &["29046", "3827", "35296", "1998"],
        synonyms: &[
            "ace inhibitor",
            "acei",
            "lisinopril",
            "enalapril",
            "ramipril",
            "captopril",
            "zestril",
            "prinivil",
            "vasotec",
            "altace",
        ],
    },
    MedicationClass {
        name: "angiotensin receptor blocker",
        rxnorm_codes: &["52175", "69749", "83818", "321064"],
        synonyms: &[
            "angiotensin receptor blocker",
            "arb",
            "losartan",
            "valsartan",
            "irbesartan",
            "olmesartan",
            "cozaar",
            "diovan",
            "avapro",
            "benicar",
        ],
    },
    MedicationClass {
        name: "beta blocker",
        rxnorm_codes: &["6918", "20352", "1202", "19484"],
        synonyms: &[
            "beta blocker",
            "beta-blocker",
            "metoprolol",
            "carvedilol",
            "atenolol",
            "bisoprolol",
            "lopressor",
            "toprol",
            "coreg",
            "tenormin",
        ],
    },
    MedicationClass {
        name: "calcium channel blocker",
        rxnorm_codes: &["17767", "3443"],
        synonyms: &[
            "calcium channel blocker",
            "ccb",
            "amlodipine",
            "diltiazem",
            "nifedipine",
            "norvasc",
            "cardizem",
        ],
    },
    MedicationClass {
        name: "diuretic",
        rxnorm_codes: &["4603", "5487", "38413", "9997"],
        synonyms: &[
            "diuretic",
            "furosemide",
            "hydrochlorothiazide",
            "hctz",
            "torsemide",
            "spironolactone",
            "lasix",
            "aldactone",
        ],
    },
    MedicationClass {
        name: "anticoagulant",
        rxnorm_codes: &["11289", "1364430", "1114195", "1037042"],
        synonyms: &[
            "anticoagulant",
            "warfarin",
            "apixaban",
            "rivaroxaban",
            "dabigatran",
            "coumadin",
            "eliquis",
            "xarelto",
            "pradaxa",
        ],
    },
    MedicationClass {
        name: "antiplatelet",
        rxnorm_codes: &["1191", "32968", "613391"],
        synonyms: &[
            "antiplatelet",
            "aspirin",
            "clopidogrel",
            "ticagrelor",
            "prasugrel",
            "plavix",
            "brilinta",
            "effient",
        ],
    },
];

/// SNOMED-coded clinical statuses seen in condition records whose status is
/// carried as a coding rather than a plain token.
pub static CODED_CLINICAL_STATUSES: &[(&str, &str)] = &[
    ("55561003", "active"),
    ("73425007", "inactive"),
    ("413322009", "resolved"),
    ("277022003", "remission"),
    ("255227004", "recurrence"),
    ("263855007", "relapse"),
];

static BIOMARKER_INDEX: LazyLock<HashMap<&'static str, &'static BiomarkerSpec>> =
    LazyLock::new(|| {
        let mut index = HashMap::new();
        for spec in BIOMARKERS {
            for alias in spec.aliases {
                index.insert(*alias, spec);
            }
        }
        index
    });

static CONDITION_INDEX: LazyLock<HashMap<&'static str, &'static ConditionClass>> =
    LazyLock::new(|| {
        let mut index = HashMap::new();
        for class in CONDITION_CLASSES {
            // Synonyms may be shared between a child and its parent class;
            // the first (more specific, listed earlier) entry wins.
            index.entry(class.name).or_insert(class);
            for synonym in class.synonyms {
                index.entry(*synonym).or_insert(class);
            }
        }
        index
    });

static MEDICATION_INDEX: LazyLock<HashMap<&'static str, &'static MedicationClass>> =
    LazyLock::new(|| {
        let mut index = HashMap::new();
        for class in MEDICATION_CLASSES {
            index.entry(class.name).or_insert(class);
            for synonym in class.synonyms {
                index.entry(*synonym).or_insert(class);
            }
        }
        index
    });

/// Look up a biomarker by name or alias (case-insensitive, trimmed).
pub fn biomarker_spec(query: &str) -> Option<&'static BiomarkerSpec> {
    BIOMARKER_INDEX
        .get(query.trim().to_lowercase().as_str())
        .copied()
}

/// Look up a condition class by name or synonym (case-insensitive, trimmed).
pub fn condition_class(query: &str) -> Option<&'static ConditionClass> {
    CONDITION_INDEX
        .get(query.trim().to_lowercase().as_str())
        .copied()
}

/// Look up a medication class by name or synonym (case-insensitive, trimmed).
pub fn medication_class(query: &str) -> Option<&'static MedicationClass> {
    MEDICATION_INDEX
        .get(query.trim().to_lowercase().as_str())
        .copied()
}

/// Resolve a coded clinical-status identifier to its status token.
pub fn status_token_for_code(code: &str) -> Option<&'static str> {
    CODED_CLINICAL_STATUSES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, token)| *token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn biomarker_aliases_resolve_case_insensitively() {
        let spec = biomarker_spec("LDL Cholesterol").expect("ldl alias");
        assert_eq!(spec.name, "LDL cholesterol");
        assert_eq!(spec.loinc_codes[0], "18262-6");

        let spec = biomarker_spec("  HbA1c ").expect("trimmed alias");
        assert_eq!(spec.name, "HbA1c");
    }

    #[test]
    fn condition_class_resolves_by_synonym() {
        let class = condition_class("prior myocardial infarction").expect("MI synonym");
        assert_eq!(class.name, "myocardial infarction");
        assert!(class.parents.contains(&"coronary artery disease"));
    }

    #[test]
    fn every_parent_class_exists() {
        for class in CONDITION_CLASSES {
            for parent in class.parents {
                assert!(
                    condition_class(parent).is_some(),
                    "class '{}' names missing parent '{}'",
                    class.name,
                    parent
                );
            }
        }
    }

    #[test]
    fn medication_class_resolves_brand_names() {
        let class = medication_class("Lipitor").expect("brand alias");
        assert_eq!(class.name, "statin");
    }

    #[test]
    fn coded_statuses_map_to_known_tokens() {
        assert_eq!(status_token_for_code("55561003"), Some("active"));
        assert_eq!(status_token_for_code("413322009"), Some("resolved"));
        assert_eq!(status_token_for_code("00000000"), None);
    }
}
