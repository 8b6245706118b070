use std::collections::HashMap;

/// Case-insensitive index of column names to their position.
#[derive(Debug, Clone, Default)]
pub struct CaseInsensitiveSet {
    map: HashMap<String, (usize, String)>,
}

impl CaseInsensitiveSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut map = HashMap::new();
        for (position, name) in names.into_iter().enumerate() {
            let name = name.as_ref();
            map.entry(name.trim().to_ascii_uppercase())
                .or_insert_with(|| (position, name.to_string()));
        }
        Self { map }
    }

    /// Original spelling of a name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.map
            .get(&name.trim().to_ascii_uppercase())
            .map(|(_, original)| original.as_str())
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.map
            .get(&name.trim().to_ascii_uppercase())
            .map(|(position, _)| *position)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(&name.trim().to_ascii_uppercase())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
