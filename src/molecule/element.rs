/// Element symbols indexed by atomic number. Slot 0 is reserved for
/// anything that is not a real element (abbreviations, R-groups, dummies).
pub const ELEMENTS: [&str; 112] = [
    "", "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S",
    "Cl", "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge",
    "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd",
    "In", "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd",
    "Tb", "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg",
    "Tl", "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm",
    "Bk", "Cf", "Es", "Fm", "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", "Rg",
];

/// Atomic number for a symbol, or `None` for non-element labels.
pub fn atomic_number(symbol: &str) -> Option<usize> {
    if symbol.is_empty() {
        return None;
    }
    ELEMENTS.iter().skip(1).position(|el| *el == symbol).map(|pos| pos + 1)
}

/// Default valences used for implicit hydrogen counting.
pub(crate) fn default_valence(symbol: &str) -> Option<i32> {
    match symbol {
        "C" => Some(4),
        "N" => Some(3),
        "O" => Some(2),
        "S" => Some(2),
        "P" => Some(3),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_numbers_of_common_elements() {
        assert_eq!(atomic_number("H"), Some(1));
        assert_eq!(atomic_number("C"), Some(6));
        assert_eq!(atomic_number("Cl"), Some(17));
        assert_eq!(atomic_number("Rg"), Some(111));
    }

    #[test]
    fn abbreviations_have_no_atomic_number() {
        assert_eq!(atomic_number(""), None);
        assert_eq!(atomic_number("CO|2|Me"), None);
        assert_eq!(atomic_number("Ph"), None);
    }
}
