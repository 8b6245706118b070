//! Built-in domain definitions (SDTMIG v3.4 subset).

use sdtm_model::{
    BaselineSpec, CoreDesignation, DatasetClass, Domain, DomainDependency, StudyDayPair,
    TimingPair, Variable, VariableType,
};

use crate::codelists;

const REQ: CoreDesignation = CoreDesignation::Required;
const EXP: CoreDesignation = CoreDesignation::Expected;
const PERM: CoreDesignation = CoreDesignation::Permissible;

struct DomainBuilder {
    domain: Domain,
}

impl DomainBuilder {
    fn new(code: &str, label: &str, dataset_class: DatasetClass) -> Self {
        Self {
            domain: Domain {
                code: code.to_string(),
                label: label.to_string(),
                dataset_class,
                variables: Vec::new(),
                key_variables: Vec::new(),
                sort_key: Vec::new(),
                dependencies: Vec::new(),
                timing_pairs: Vec::new(),
                study_days: Vec::new(),
                epoch_anchor: None,
                baseline: None,
            },
        }
    }

    /// STUDYID, DOMAIN and USUBJID lead every subject-level domain.
    fn identifiers(self) -> Self {
        self.char("STUDYID", "Study Identifier", REQ)
            .char("DOMAIN", "Domain Abbreviation", REQ)
            .char("USUBJID", "Unique Subject Identifier", REQ)
    }

    fn push(mut self, mut variable: Variable) -> Self {
        variable.order = self.domain.variables.len() as u32 + 1;
        self.domain.variables.push(variable);
        self
    }

    fn char(self, name: &str, label: &str, core: CoreDesignation) -> Self {
        self.push(Variable::new(name, label, VariableType::Char, core))
    }

    fn num(self, name: &str, label: &str, core: CoreDesignation) -> Self {
        self.push(Variable::new(name, label, VariableType::Num, core))
    }

    fn coded(self, name: &str, label: &str, core: CoreDesignation, codelist: &str) -> Self {
        self.push(Variable::new(name, label, VariableType::Char, core).with_codelist(codelist))
    }

    fn seq(self) -> Self {
        let name = format!("{}SEQ", self.domain.code);
        self.num(&name, "Sequence Number", REQ)
    }

    fn keys(mut self, keys: &[&str]) -> Self {
        self.domain.key_variables = keys.iter().map(|k| (*k).to_string()).collect();
        self
    }

    fn sort(mut self, sort_key: &[&str]) -> Self {
        self.domain.sort_key = sort_key.iter().map(|k| (*k).to_string()).collect();
        self
    }

    fn depends_on(mut self, domain: &str, required: bool) -> Self {
        self.domain.dependencies.push(DomainDependency {
            domain: domain.to_string(),
            required,
        });
        self
    }

    fn timing(mut self, start: &str, end: &str) -> Self {
        self.domain.timing_pairs.push(TimingPair {
            start: start.to_string(),
            end: end.to_string(),
        });
        self
    }

    fn study_day(mut self, date: &str, day: &str) -> Self {
        self.domain.study_days.push(StudyDayPair {
            date: date.to_string(),
            day: day.to_string(),
        });
        self
    }

    fn epoch(mut self, anchor: &str) -> Self {
        self.domain.epoch_anchor = Some(anchor.to_string());
        self
    }

    fn baseline(mut self) -> Self {
        let code = self.domain.code.clone();
        self.domain.baseline = Some(BaselineSpec {
            test_code: format!("{code}TESTCD"),
            date: format!("{code}DTC"),
            status: format!("{code}STAT"),
            flag: format!("{code}BLFL"),
        });
        self
    }

    fn build(self) -> Domain {
        self.domain
    }
}

fn dm() -> Domain {
    DomainBuilder::new("DM", "Demographics", DatasetClass::SpecialPurpose)
        .identifiers()
        .char("SUBJID", "Subject Identifier for the Study", REQ)
        .char("RFSTDTC", "Subject Reference Start Date/Time", EXP)
        .char("RFENDTC", "Subject Reference End Date/Time", EXP)
        .char("RFPENDTC", "Date/Time of End of Participation", EXP)
        .char("SITEID", "Study Site Identifier", REQ)
        .char("BRTHDTC", "Date/Time of Birth", PERM)
        .num("AGE", "Age", EXP)
        .coded("AGEU", "Age Units", EXP, codelists::AGEU)
        .coded("SEX", "Sex", REQ, codelists::SEX)
        .coded("RACE", "Race", EXP, codelists::RACE)
        .coded("ETHNIC", "Ethnicity", PERM, codelists::ETHNIC)
        .char("ARMCD", "Planned Arm Code", EXP)
        .char("ARM", "Description of Planned Arm", EXP)
        .char("COUNTRY", "Country", PERM)
        .keys(&["STUDYID", "USUBJID"])
        .timing("RFSTDTC", "RFENDTC")
        .build()
}

fn se() -> Domain {
    DomainBuilder::new("SE", "Subject Elements", DatasetClass::SpecialPurpose)
        .identifiers()
        .seq()
        .char("ETCD", "Element Code", REQ)
        .char("ELEMENT", "Description of Element", PERM)
        .coded("EPOCH", "Epoch", REQ, codelists::EPOCH)
        .char("SESTDTC", "Start Date/Time of Element", REQ)
        .char("SEENDTC", "End Date/Time of Element", EXP)
        .num("SESTDY", "Study Day of Start of Element", PERM)
        .num("SEENDY", "Study Day of End of Element", PERM)
        .keys(&["STUDYID", "USUBJID", "ETCD"])
        .sort(&["SESTDTC", "ETCD"])
        .depends_on("DM", true)
        .timing("SESTDTC", "SEENDTC")
        .study_day("SESTDTC", "SESTDY")
        .study_day("SEENDTC", "SEENDY")
        .build()
}

fn ae() -> Domain {
    DomainBuilder::new("AE", "Adverse Events", DatasetClass::Events)
        .identifiers()
        .seq()
        .char("AETERM", "Reported Term for the Adverse Event", REQ)
        .char("AEDECOD", "Dictionary-Derived Term", EXP)
        .char("AEBODSYS", "Body System or Organ Class", EXP)
        .coded("AESEV", "Severity/Intensity", PERM, codelists::AESEV)
        .coded("AESER", "Serious Event", EXP, codelists::NY)
        .char("AEREL", "Causality", EXP)
        .coded("EPOCH", "Epoch", PERM, codelists::EPOCH)
        .char("AESTDTC", "Start Date/Time of Adverse Event", EXP)
        .char("AEENDTC", "End Date/Time of Adverse Event", EXP)
        .num("AESTDY", "Study Day of Start of Adverse Event", PERM)
        .num("AEENDY", "Study Day of End of Adverse Event", PERM)
        .keys(&["STUDYID", "USUBJID", "AETERM"])
        .sort(&["AESTDTC", "AETERM"])
        .depends_on("DM", true)
        .depends_on("SE", false)
        .timing("AESTDTC", "AEENDTC")
        .study_day("AESTDTC", "AESTDY")
        .study_day("AEENDTC", "AEENDY")
        .epoch("AESTDTC")
        .build()
}

fn cm() -> Domain {
    DomainBuilder::new("CM", "Concomitant/Prior Medications", DatasetClass::Interventions)
        .identifiers()
        .seq()
        .char("CMTRT", "Reported Name of Drug, Med, or Therapy", REQ)
        .char("CMDECOD", "Standardized Medication Name", PERM)
        .num("CMDOSE", "Dose per Administration", PERM)
        .coded("CMDOSU", "Dose Units", PERM, codelists::UNIT)
        .coded("CMROUTE", "Route of Administration", PERM, codelists::ROUTE)
        .coded("EPOCH", "Epoch", PERM, codelists::EPOCH)
        .char("CMSTDTC", "Start Date/Time of Medication", PERM)
        .char("CMENDTC", "End Date/Time of Medication", PERM)
        .num("CMSTDY", "Study Day of Start of Medication", PERM)
        .num("CMENDY", "Study Day of End of Medication", PERM)
        .keys(&["STUDYID", "USUBJID", "CMTRT"])
        .sort(&["CMSTDTC", "CMTRT"])
        .depends_on("DM", true)
        .depends_on("SE", false)
        .timing("CMSTDTC", "CMENDTC")
        .study_day("CMSTDTC", "CMSTDY")
        .study_day("CMENDTC", "CMENDY")
        .epoch("CMSTDTC")
        .build()
}

fn ex() -> Domain {
    DomainBuilder::new("EX", "Exposure", DatasetClass::Interventions)
        .identifiers()
        .seq()
        .char("EXTRT", "Name of Treatment", REQ)
        .num("EXDOSE", "Dose", EXP)
        .coded("EXDOSU", "Dose Units", EXP, codelists::UNIT)
        .coded("EXROUTE", "Route of Administration", PERM, codelists::ROUTE)
        .coded("EPOCH", "Epoch", PERM, codelists::EPOCH)
        .char("EXSTDTC", "Start Date/Time of Treatment", EXP)
        .char("EXENDTC", "End Date/Time of Treatment", PERM)
        .num("EXSTDY", "Study Day of Start of Treatment", PERM)
        .num("EXENDY", "Study Day of End of Treatment", PERM)
        .keys(&["STUDYID", "USUBJID", "EXTRT"])
        .sort(&["EXSTDTC", "EXTRT"])
        .depends_on("DM", true)
        .depends_on("SE", false)
        .timing("EXSTDTC", "EXENDTC")
        .study_day("EXSTDTC", "EXSTDY")
        .study_day("EXENDTC", "EXENDY")
        .epoch("EXSTDTC")
        .build()
}

fn ds() -> Domain {
    DomainBuilder::new("DS", "Disposition", DatasetClass::Events)
        .identifiers()
        .seq()
        .char("DSTERM", "Reported Term for the Disposition Event", REQ)
        .char("DSDECOD", "Standardized Disposition Term", REQ)
        .coded("DSCAT", "Category for Disposition Event", EXP, codelists::DSCAT)
        .coded("EPOCH", "Epoch", PERM, codelists::EPOCH)
        .char("DSSTDTC", "Start Date/Time of Disposition Event", EXP)
        .num("DSSTDY", "Study Day of Start of Disposition Event", PERM)
        .keys(&["STUDYID", "USUBJID", "DSDECOD"])
        .sort(&["DSSTDTC", "DSTERM"])
        .depends_on("DM", true)
        .depends_on("SE", false)
        .study_day("DSSTDTC", "DSSTDY")
        .epoch("DSSTDTC")
        .build()
}

fn mh() -> Domain {
    DomainBuilder::new("MH", "Medical History", DatasetClass::Events)
        .identifiers()
        .seq()
        .char("MHTERM", "Reported Term for the Medical History", REQ)
        .char("MHDECOD", "Dictionary-Derived Term", PERM)
        .char("MHSTDTC", "Start Date/Time of Medical History Event", PERM)
        .char("MHENDTC", "End Date/Time of Medical History Event", PERM)
        .keys(&["STUDYID", "USUBJID", "MHTERM"])
        .sort(&["MHSTDTC", "MHTERM"])
        .depends_on("DM", true)
        .timing("MHSTDTC", "MHENDTC")
        .build()
}

/// Findings domains share one shape; only the prefix and test codelist differ.
fn findings(code: &str, label: &str, test_codelist: &str) -> Domain {
    let v = |suffix: &str| format!("{code}{suffix}");
    let testcd = v("TESTCD");
    let dtc = v("DTC");
    DomainBuilder::new(code, label, DatasetClass::Findings)
        .identifiers()
        .seq()
        .coded(&testcd, "Short Name of Test", REQ, test_codelist)
        .char(&v("TEST"), "Name of Test", REQ)
        .char(&v("CAT"), "Category of Test", PERM)
        .char(&v("ORRES"), "Result or Finding in Original Units", EXP)
        .coded(&v("ORRESU"), "Original Units", EXP, codelists::UNIT)
        .char(&v("STRESC"), "Character Result/Finding in Std Format", EXP)
        .num(&v("STRESN"), "Numeric Result/Finding in Standard Units", EXP)
        .coded(&v("STRESU"), "Standard Units", EXP, codelists::UNIT)
        .coded(&v("STAT"), "Completion Status", PERM, codelists::ND)
        .char(&v("BLFL"), "Baseline Flag", EXP)
        .num("VISITNUM", "Visit Number", EXP)
        .char("VISIT", "Visit Name", PERM)
        .coded("EPOCH", "Epoch", PERM, codelists::EPOCH)
        .char(&dtc, "Date/Time of Collection", EXP)
        .num(&v("DY"), "Study Day of Collection", PERM)
        .keys(&["STUDYID", "USUBJID", testcd.as_str()])
        .sort(&[testcd.as_str(), "VISITNUM", dtc.as_str()])
        .depends_on("DM", true)
        .depends_on("SE", false)
        .study_day(&dtc, &v("DY"))
        .epoch(&dtc)
        .baseline()
        .build()
}

fn tv() -> Domain {
    DomainBuilder::new("TV", "Trial Visits", DatasetClass::TrialDesign)
        .char("STUDYID", "Study Identifier", REQ)
        .char("DOMAIN", "Domain Abbreviation", REQ)
        .num("VISITNUM", "Visit Number", REQ)
        .char("VISIT", "Visit Name", PERM)
        .char("ARMCD", "Planned Arm Code", PERM)
        .keys(&["STUDYID", "VISITNUM"])
        .sort(&["VISITNUM"])
        .build()
}

pub fn builtin_domains() -> Vec<Domain> {
    vec![
        dm(),
        se(),
        ae(),
        cm(),
        ex(),
        ds(),
        mh(),
        findings("LB", "Laboratory Test Results", codelists::LBTESTCD),
        findings("VS", "Vital Signs", codelists::VSTESTCD),
        tv(),
    ]
}
