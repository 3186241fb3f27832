use std::fmt;
use std::path::Path;

/// Closed set of declared parameter types. Cab definitions name these as
/// strings ("int", "File", "List[MS]", ...); they are parsed once when the
/// cab is compiled and dispatched on explicitly from then on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DType {
    Str,
    Int,
    Float,
    Bool,
    File,
    Directory,
    /// Measurement set: a directory with extra meaning to the task.
    MS,
    List(Box<DType>),
}

impl DType {
    pub fn parse(spec: &str) -> Option<Self> {
        let spec = spec.trim();
        if let Some(inner) = spec.strip_prefix("List[").and_then(|r| r.strip_suffix(']')) {
            return Self::parse(inner).map(|elem| Self::List(Box::new(elem)));
        }
        match spec {
            "str" => Some(Self::Str),
            "int" => Some(Self::Int),
            "float" => Some(Self::Float),
            "bool" => Some(Self::Bool),
            "File" => Some(Self::File),
            "Directory" => Some(Self::Directory),
            "MS" => Some(Self::MS),
            _ => None,
        }
    }

    pub fn is_file_kind(&self) -> bool {
        matches!(self, Self::File | Self::Directory | Self::MS)
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// The file-ish dtype underneath, if any: the dtype itself, or the
    /// element type of a list of file-ish values.
    pub fn file_element(&self) -> Option<&DType> {
        match self {
            Self::File | Self::Directory | Self::MS => Some(self),
            Self::List(elem) if elem.is_file_kind() => Some(elem),
            _ => None,
        }
    }

    /// Whether an on-disk path has the kind this dtype requires. Only
    /// meaningful for file-ish dtypes.
    pub fn kind_matches(&self, path: &Path) -> bool {
        match self {
            Self::File => path.is_file(),
            Self::Directory | Self::MS => path.is_dir(),
            _ => false,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str => write!(f, "str"),
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::Bool => write!(f, "bool"),
            Self::File => write!(f, "File"),
            Self::Directory => write!(f, "Directory"),
            Self::MS => write!(f, "MS"),
            Self::List(elem) => write!(f, "List[{elem}]"),
        }
    }
}
