//! Built-in controlled terminology used by the registry domains.
//!
//! Only the codelists bound to registry variables are included. A full CT
//! release can be merged on top with [`crate::load_ct_csv`].

use sdtm_model::{Codelist, Term};

use crate::findings::{lb_tests, vs_tests};

pub const SEX: &str = "C66731";
pub const NY: &str = "C66742";
pub const AESEV: &str = "C66769";
pub const ROUTE: &str = "C66729";
pub const UNIT: &str = "C71620";
pub const AGEU: &str = "C66781";
pub const ND: &str = "C66789";
pub const EPOCH: &str = "C99079";
pub const LBTESTCD: &str = "C65047";
pub const VSTESTCD: &str = "C66741";
pub const RACE: &str = "C74457";
pub const ETHNIC: &str = "C66790";
pub const DSCAT: &str = "C74558";

fn closed(code: &str, name: &str, terms: &[(&str, &str, &[&str])]) -> Codelist {
    build(Codelist::new(code, name, false), terms)
}

fn extensible(code: &str, name: &str, terms: &[(&str, &str, &[&str])]) -> Codelist {
    build(Codelist::new(code, name, true), terms)
}

fn build(mut codelist: Codelist, terms: &[(&str, &str, &[&str])]) -> Codelist {
    for (term_code, value, synonyms) in terms {
        codelist.add_term(Term::new(term_code, value).with_synonyms(synonyms));
    }
    codelist
}

pub fn builtin_codelists() -> Vec<Codelist> {
    let mut codelists = vec![
        closed(
            SEX,
            "Sex",
            &[
                ("C16576", "F", &["Female"]),
                ("C20197", "M", &["Male"]),
                ("C17998", "U", &["Unknown", "UNK"]),
                ("C45908", "INTERSEX", &[]),
            ],
        ),
        closed(
            NY,
            "No Yes Response",
            &[
                ("C49487", "N", &["No"]),
                ("C49488", "Y", &["Yes"]),
                ("C48660", "NA", &["Not Applicable"]),
                ("C17998", "U", &["Unknown"]),
            ],
        ),
        closed(
            AESEV,
            "Severity/Intensity Scale for Adverse Events",
            &[
                ("C41338", "MILD", &["1", "Grade 1"]),
                ("C41339", "MODERATE", &["2", "Grade 2"]),
                ("C41340", "SEVERE", &["3", "Grade 3"]),
            ],
        ),
        extensible(
            ROUTE,
            "Route of Administration Response",
            &[
                ("C38288", "ORAL", &["PO", "By mouth"]),
                ("C38276", "INTRAVENOUS", &["IV"]),
                ("C38299", "SUBCUTANEOUS", &["SC", "SQ"]),
                ("C28161", "INTRAMUSCULAR", &["IM"]),
                ("C38304", "TOPICAL", &[]),
            ],
        ),
        extensible(
            UNIT,
            "Unit",
            &[
                ("C28253", "mg", &[]),
                ("C48155", "g", &[]),
                ("C28252", "kg", &["kilogram"]),
                ("C48531", "LB", &["lb", "pound"]),
                ("C49668", "cm", &["centimeter"]),
                ("C48500", "IN", &["in", "inch"]),
                ("C67015", "mg/dL", &[]),
                ("C64387", "mmol/L", &[]),
                ("C64783", "g/dL", &[]),
                ("C42576", "g/L", &[]),
                ("C48508", "umol/L", &["µmol/L"]),
                ("C67456", "U/L", &["IU/L"]),
                ("C67255", "10^9/L", &["x10^9/L", "10*9/L"]),
                ("C49670", "mmHg", &["mm Hg"]),
                ("C49673", "beats/min", &["bpm"]),
                ("C49674", "breaths/min", &[]),
                ("C42559", "C", &["Celsius"]),
                ("C28254", "mL", &[]),
            ],
        ),
        closed(
            AGEU,
            "Age Unit",
            &[
                ("C29848", "YEARS", &["Year", "Years"]),
                ("C29846", "MONTHS", &["Month"]),
                ("C29844", "WEEKS", &["Week"]),
                ("C25301", "DAYS", &["Day"]),
            ],
        ),
        closed(ND, "Not Done", &[("C49484", "NOT DONE", &["ND"])]),
        extensible(
            EPOCH,
            "Epoch",
            &[
                ("C48262", "SCREENING", &[]),
                ("C98779", "RUN-IN", &[]),
                ("C101526", "TREATMENT", &[]),
                ("C99158", "FOLLOW-UP", &["Follow up"]),
            ],
        ),
        closed(
            RACE,
            "Race",
            &[
                ("C41260", "ASIAN", &[]),
                ("C16352", "BLACK OR AFRICAN AMERICAN", &["Black"]),
                ("C41261", "WHITE", &["Caucasian"]),
                ("C41259", "AMERICAN INDIAN OR ALASKA NATIVE", &[]),
                ("C41219", "NATIVE HAWAIIAN OR OTHER PACIFIC ISLANDER", &[]),
                ("C43234", "NOT REPORTED", &[]),
                ("C17998", "UNKNOWN", &[]),
            ],
        ),
        closed(
            ETHNIC,
            "Ethnic Group",
            &[
                ("C17459", "HISPANIC OR LATINO", &[]),
                ("C41222", "NOT HISPANIC OR LATINO", &[]),
                ("C43234", "NOT REPORTED", &[]),
                ("C17998", "UNKNOWN", &[]),
            ],
        ),
        closed(
            DSCAT,
            "Category for Disposition Event",
            &[
                ("C74590", "DISPOSITION EVENT", &[]),
                ("C74588", "PROTOCOL MILESTONE", &[]),
                ("C150824", "OTHER EVENT", &[]),
            ],
        ),
    ];

    let mut lb = Codelist::new(LBTESTCD, "Laboratory Test Code", true);
    for test in lb_tests().tests() {
        lb.add_term(Term::new("", &test.code));
    }
    let mut vs = Codelist::new(VSTESTCD, "Vital Signs Test Code", true);
    for test in vs_tests().tests() {
        vs.add_term(Term::new("", &test.code));
    }
    codelists.push(lb);
    codelists.push(vs);
    codelists
}
