//! Diagnostic codes
//!
//! Every code carries a stable identifier (`E1xxx` for resolver codes,
//! `E2xxx` for type codes), a kebab-case name used by configuration, a
//! default severity and a message template with positional `{0}`, `{1}`
//! placeholders.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How bad a diagnostic is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! diagnostic_codes {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $variant:ident = ($code:literal, $kebab:literal, $severity:ident, $message:literal), )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $( $variant, )*
        }

        impl $name {
            /// Every code, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),*];

            /// Stable identifier such as `E1001`
            pub fn as_str(self) -> &'static str {
                match self { $( $name::$variant => $code, )* }
            }

            /// Kebab-case name used in configuration files
            pub fn name(self) -> &'static str {
                match self { $( $name::$variant => $kebab, )* }
            }

            pub fn severity(self) -> Severity {
                match self { $( $name::$variant => Severity::$severity, )* }
            }

            /// Message with `{n}` placeholders
            pub fn template(self) -> &'static str {
                match self { $( $name::$variant => $message, )* }
            }
        }
    };
}

diagnostic_codes! {
    /// Problems found while binding names to declarations
    pub enum ResolverErrorCode {
        // Unresolved names
        CannotBeResolved = ("E1001", "cannot-be-resolved", Error, "cannot resolve '{0}'"),
        CannotResolveMethod = ("E1002", "cannot-resolve-method", Error, "cannot resolve method '{0}'"),
        CannotResolveMethodInClass = ("E1003", "cannot-resolve-method-in-class", Error, "cannot resolve method '{0}' in class '{1}'"),
        CannotResolveField = ("E1004", "cannot-resolve-field", Error, "cannot resolve field '{0}' in class '{1}'"),
        CannotResolveLabel = ("E1005", "cannot-resolve-label", Error, "cannot resolve label '{0}'"),
        CannotResolveConstructor = ("E1006", "cannot-resolve-constructor", Error, "cannot resolve constructor '{0}'"),
        CannotResolveSuperConstructor = ("E1007", "cannot-resolve-super-constructor", Error, "cannot resolve super constructor '{0}'"),
        CannotResolveImplicitSuperConstructor = ("E1008", "cannot-resolve-implicit-super-constructor", Error, "cannot resolve implicit call to super constructor '{0}'"),
        DefaultConstructorUnresolved = ("E1009", "default-constructor-unresolved", Error, "cannot resolve constructor '{0}' in default class '{1}'"),
        NewExpressionCantUseTypeVariable = ("E1010", "new-expression-cant-use-type-variable", Error, "cannot instantiate type variable '{0}'"),
        NotAClass = ("E1011", "not-a-class", Error, "'{0}' is not a class"),
        DidYouMeanNew = ("E1012", "did-you-mean-new", Error, "'{0}' is a class; did you mean 'new {0}()'?"),
        CannotCallLabel = ("E1013", "cannot-call-label", Error, "label '{0}' cannot be called"),
        PrefixIsNotAValue = ("E1014", "prefix-is-not-a-value", Error, "library prefix '{0}' cannot be used as a value"),
        TooManyQualifiers = ("E1015", "too-many-qualifiers", Error, "'{0}' has too many qualifiers to name a constructor"),
        TypeArgumentsOnlyOnClass = ("E1016", "type-arguments-only-on-class", Error, "type arguments are only allowed on a class name in '{0}'"),
        LibraryNotFound = ("E1017", "library-not-found", Error, "cannot find library '{0}'"),
        ImportedNameNotFound = ("E1018", "imported-name-not-found", Warning, "library '{0}' does not export '{1}'"),
        PrefixConflictsWithDeclaration = ("E1019", "prefix-conflicts-with-declaration", Error, "import prefix '{0}' conflicts with a top-level declaration"),

        // Duplicates
        DuplicateTopLevelDeclaration = ("E1101", "duplicate-top-level-declaration", Error, "duplicate top-level declaration '{0}' (other declaration at {1})"),
        DuplicateMember = ("E1102", "duplicate-member", Error, "duplicate member '{0}' (other declaration at {1})"),
        DuplicateParameter = ("E1103", "duplicate-parameter", Error, "duplicate parameter '{0}'"),
        DuplicateLocalVariable = ("E1104", "duplicate-local-variable", Error, "duplicate local variable '{0}' (previous declaration at {1})"),
        ShadowedLocalVariable = ("E1105", "shadowed-local-variable", Warning, "local variable '{0}' hides the variable declared at {1}"),
        DuplicateTypeVariable = ("E1106", "duplicate-type-variable", Error, "duplicate type variable '{0}'"),
        TypeVariableShadowsType = ("E1107", "type-variable-shadows-type", Warning, "type variable '{0}' hides the type declared at {1}"),
        DuplicateImportedName = ("E1108", "duplicate-imported-name", Error, "'{0}' is imported from more than one library ({1})"),
        DuplicateLabelInSwitch = ("E1109", "duplicate-label-in-switch", Error, "duplicate label '{0}' in switch statement"),
        DuplicateNamedArgument = ("E1110", "duplicate-named-argument", Error, "duplicate named argument '{0}'"),
        DuplicateImplementsType = ("E1111", "duplicate-implements-type", Error, "'{0}' is implemented more than once"),
        DuplicateInitialization = ("E1112", "duplicate-initialization", Error, "field '{0}' is initialized more than once"),
        ConstructorWithNameOfMember = ("E1113", "constructor-with-name-of-member", Error, "constructor '{0}' has the same name as member '{1}'"),

        // Context-dependent legality
        ThisOutsideOfMethod = ("E1201", "this-outside-of-method", Error, "'this' is only available inside instance members"),
        ThisInStaticMethod = ("E1202", "this-in-static-method", Error, "'this' cannot be used in a static member"),
        ThisInFactoryConstructor = ("E1203", "this-in-factory-constructor", Error, "'this' cannot be used in a factory constructor"),
        ThisInInitializerAsExpression = ("E1204", "this-in-initializer-as-expression", Error, "'this' cannot be used as an expression in a constructor initializer"),
        CannotUseThisInInstanceFieldInitializer = ("E1205", "cannot-use-this-in-instance-field-initializer", Error, "'this' cannot be used in an instance field initializer"),
        SuperOutsideOfMethod = ("E1206", "super-outside-of-method", Error, "'super' is only available inside instance members"),
        SuperInStaticMethod = ("E1207", "super-in-static-method", Error, "'super' cannot be used in a static member"),
        SuperInFactoryConstructor = ("E1208", "super-in-factory-constructor", Error, "'super' cannot be used in a factory constructor"),
        SuperMethodInvocationInConstructorInitializer = ("E1209", "super-method-invocation-in-constructor-initializer", Error, "super member '{0}' cannot be used in a constructor initializer"),
        IllegalFieldAccessFromStatic = ("E1210", "illegal-field-access-from-static", Error, "instance field '{0}' cannot be accessed from a static context"),
        IllegalMethodAccessFromStatic = ("E1211", "illegal-method-access-from-static", Error, "instance method '{0}' cannot be referenced from a static context"),
        InstanceMethodFromStatic = ("E1212", "instance-method-from-static", Error, "instance method '{0}' cannot be invoked from a static context"),
        InstanceMethodFromInitializer = ("E1213", "instance-method-from-initializer", Error, "instance method '{0}' cannot be invoked from an initializer"),
        InstanceMethodFromRedirect = ("E1214", "instance-method-from-redirect", Error, "instance method '{0}' cannot be invoked from a redirecting constructor call"),
        CannotUseInstanceFieldInInstanceFieldInitializer = ("E1215", "cannot-use-instance-field-in-instance-field-initializer", Error, "instance field '{0}' cannot be used in an instance field initializer"),
        CannotAccessFieldInInitializer = ("E1216", "cannot-access-field-in-initializer", Error, "instance field '{0}' cannot be read in a constructor initializer"),
        TypeVariableNotAllowedInIdentifier = ("E1217", "type-variable-not-allowed-in-identifier", Error, "type variable '{0}' cannot be used as an expression"),
        NotAStaticField = ("E1218", "not-a-static-field", Error, "'{0}' is not a static field of '{1}'"),
        NotAStaticMethod = ("E1219", "not-a-static-method", Error, "'{0}' is not a static method of '{1}'"),
        StaticMemberAccessedThroughSuper = ("E1220", "static-member-accessed-through-super", Error, "static member '{0}' cannot be accessed through 'super'"),
        RethrowNotInCatch = ("E1221", "rethrow-not-in-catch", Error, "'throw' without a value is only allowed inside a catch block"),
        InvalidReturnInConstructor = ("E1222", "invalid-return-in-constructor", Error, "generative constructors cannot return a value"),
        VariableReferencesSameNameInInitializer = ("E1223", "variable-references-same-name-in-initializer", Error, "variable '{0}' is referenced in its own initializer"),
        UsingLocalVariableBeforeDeclaration = ("E1224", "using-local-variable-before-declaration", Error, "local variable '{0}' is used before its declaration"),
        InitializersOnlyInConstructors = ("E1225", "initializers-only-in-constructors", Error, "'{0}' is not a constructor and cannot have initializers"),

        // Privacy
        IllegalAccessToPrivate = ("E1301", "illegal-access-to-private", Error, "'{0}' is private to library '{1}'"),
        IllegalAccessToPrivateMember = ("E1302", "illegal-access-to-private-member", Error, "member '{0}' of '{1}' is private to library '{2}'"),

        // Supertypes
        CyclicClass = ("E1401", "cyclic-class", Error, "'{0}' is a supertype of itself"),
        CannotExtendBuiltin = ("E1402", "cannot-extend-builtin", Error, "'{0}' cannot be extended or implemented"),
        DefaultMustSpecifyClass = ("E1403", "default-must-specify-class", Error, "default '{0}' must name a class"),
        TypeParametersMustMatchExactly = ("E1404", "type-parameters-must-match-exactly", Error, "type parameters of default class '{0}' must match '{1}' exactly, found '{2}'"),
        DefaultClauseOnClass = ("E1405", "default-clause-on-class", Error, "only interfaces can declare a default class"),
        NotAnInterface = ("E1406", "not-an-interface", Error, "'{0}' cannot be implemented"),

        // Member shape
        ConstructorCannotBeStatic = ("E1501", "constructor-cannot-be-static", Error, "constructor '{0}' cannot be static"),
        ConstructorCannotBeAbstract = ("E1502", "constructor-cannot-be-abstract", Error, "constructor '{0}' cannot be abstract"),
        ConstructorCannotHaveReturnType = ("E1503", "constructor-cannot-have-return-type", Error, "constructor '{0}' cannot declare a return type"),
        FactoryCannotBeConst = ("E1504", "factory-cannot-be-const", Error, "factory constructor '{0}' cannot be const"),
        ConstConstructorCannotHaveBody = ("E1505", "const-constructor-cannot-have-body", Error, "const constructor '{0}' cannot have a body"),
        CannotDeclareNonFactoryConstructor = ("E1506", "cannot-declare-non-factory-constructor", Error, "constructor '{0}' for another type must be a factory"),
        MainFunctionParameters = ("E1507", "main-function-parameters", Error, "'main' must not declare parameters"),
        ParameterInitOutsideConstructor = ("E1508", "parameter-init-outside-constructor", Error, "field parameter 'this.{0}' is only allowed in generative constructors"),
        ParameterInitWithRedirectingConstructor = ("E1509", "parameter-init-with-redirecting-constructor", Error, "field parameter 'this.{0}' is not allowed in a redirecting constructor"),
        ParameterNotMatchField = ("E1510", "parameter-not-match-field", Error, "'{0}' does not name a field of '{1}'"),
        ParameterInitStaticField = ("E1511", "parameter-init-static-field", Error, "field parameter 'this.{0}' cannot initialize a static field"),
        NamedParameterCannotStartWithUnderscore = ("E1512", "named-parameter-cannot-start-with-underscore", Error, "named parameter '{0}' cannot start with '_'"),
        StaticFinalRequiresValue = ("E1513", "static-final-requires-value", Error, "static final field '{0}' must be initialized"),
        TopLevelFinalRequiresValue = ("E1514", "top-level-final-requires-value", Error, "top-level final variable '{0}' must be initialized"),
        ConstantsMustBeInitialized = ("E1515", "constants-must-be-initialized", Error, "constant '{0}' must be initialized"),
        CannotOverrideInstanceMember = ("E1516", "cannot-override-instance-member", Error, "static member '{0}' cannot override an instance member of '{1}'"),
        ConstClassWithNonFinalFields = ("E1517", "const-class-with-non-final-fields", Error, "class '{0}' has a const constructor but field '{1}' is not final"),
        FinalFieldMustBeInitialized = ("E1518", "final-field-must-be-initialized", Error, "final field '{0}' must be initialized"),
        CannotInitStaticFieldInInitializer = ("E1519", "cannot-init-static-field-in-initializer", Error, "static field '{0}' cannot be initialized in a constructor initializer"),
        CannotInitFieldFromSubclass = ("E1520", "cannot-init-field-from-subclass", Error, "field '{0}' is declared in a superclass and cannot be initialized here"),
        ExpectedFieldNotMethod = ("E1521", "expected-field-not-method", Error, "'{0}' is not a field"),
        RedirectionConstructorCycle = ("E1522", "redirection-constructor-cycle", Error, "constructor '{0}' redirects to itself"),
        RedirectingConstructorHasInitializers = ("E1523", "redirecting-constructor-has-initializers", Error, "redirecting constructor '{0}' cannot have other initializers"),

        // Assignment
        CannotAssignToFinal = ("E1601", "cannot-assign-to-final", Error, "cannot assign to final '{0}'"),
        CannotAssignToMethod = ("E1602", "cannot-assign-to-method", Error, "cannot assign to method '{0}'"),
        FieldDoesNotHaveASetter = ("E1603", "field-does-not-have-a-setter", Error, "'{0}' has no setter"),
        FieldDoesNotHaveAGetter = ("E1604", "field-does-not-have-a-getter", Error, "'{0}' has no getter"),
        CannotAssignTo = ("E1605", "cannot-assign-to", Error, "'{0}' cannot be assigned"),

        // Compile-time constants
        ExpectedConstantExpression = ("E1701", "expected-constant-expression", Error, "expected a constant expression"),
        ExpectedConstantExpressionBoolean = ("E1702", "expected-constant-expression-boolean", Error, "expected a constant expression of type 'bool'"),
        ExpectedConstantExpressionInt = ("E1703", "expected-constant-expression-int", Error, "expected a constant expression of type 'int'"),
        ExpectedConstantExpressionNumber = ("E1704", "expected-constant-expression-number", Error, "expected a constant expression of type 'num'"),
        ExpectedConstantExpressionStringNumberBool = ("E1705", "expected-constant-expression-string-number-bool", Error, "expected a constant expression of type 'String', 'num' or 'bool'"),
        CircularReference = ("E1706", "circular-reference", Error, "'{0}' depends on itself"),
        ConstArrayWithTypeVariable = ("E1707", "const-array-with-type-variable", Error, "const list literals cannot use type variable '{0}'"),
        ConstMapWithTypeVariable = ("E1708", "const-map-with-type-variable", Error, "const map literals cannot use type variable '{0}'"),
        ConstNewRequiresConstConstructor = ("E1709", "const-new-requires-const-constructor", Error, "'{0}' is not a const constructor"),
        ConstMapKeyMustBeString = ("E1710", "const-map-key-must-be-string", Error, "const map keys must be constant strings"),
    }
}

diagnostic_codes! {
    /// Problems with type annotations
    pub enum TypeErrorCode {
        NoSuchType = ("E2001", "no-such-type", Error, "no such type '{0}'"),
        NotAType = ("E2002", "not-a-type", Error, "'{0}' is not a type"),
        WrongNumberOfTypeArguments = ("E2003", "wrong-number-of-type-arguments", Error, "'{0}' expects {1} type argument(s), found {2}"),
        TypeVariableInStaticContext = ("E2004", "type-variable-in-static-context", Error, "type variable '{0}' cannot be used in a static context"),
        TypeArgumentsOnTypeVariable = ("E2005", "type-arguments-on-type-variable", Error, "type variable '{0}' cannot have type arguments"),
        AmbiguousType = ("E2006", "ambiguous-type", Error, "type '{0}' is imported from more than one library ({1})"),
        CyclicTypeVariableBound = ("E2007", "cyclic-type-variable-bound", Error, "type variable '{0}' is a bound of itself"),
    }
}

/// Any diagnostic code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorCode {
    Resolver(ResolverErrorCode),
    Type(TypeErrorCode),
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Resolver(code) => code.as_str(),
            ErrorCode::Type(code) => code.as_str(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ErrorCode::Resolver(code) => code.name(),
            ErrorCode::Type(code) => code.name(),
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            ErrorCode::Resolver(code) => code.severity(),
            ErrorCode::Type(code) => code.severity(),
        }
    }

    pub fn template(self) -> &'static str {
        match self {
            ErrorCode::Resolver(code) => code.template(),
            ErrorCode::Type(code) => code.template(),
        }
    }

    /// Look a code up by its kebab-case name or its `Exxxx` identifier
    pub fn from_name(name: &str) -> Option<ErrorCode> {
        let resolver = ResolverErrorCode::ALL
            .iter()
            .find(|code| code.name() == name || code.as_str() == name)
            .map(|&code| ErrorCode::Resolver(code));
        resolver.or_else(|| {
            TypeErrorCode::ALL
                .iter()
                .find(|code| code.name() == name || code.as_str() == name)
                .map(|&code| ErrorCode::Type(code))
        })
    }

    /// Substitute `{n}` placeholders in the template with `args`
    pub fn format(self, args: &[String]) -> String {
        format_template(self.template(), args)
    }
}

impl From<ResolverErrorCode> for ErrorCode {
    fn from(code: ResolverErrorCode) -> Self {
        ErrorCode::Resolver(code)
    }
}

impl From<TypeErrorCode> for ErrorCode {
    fn from(code: TypeErrorCode) -> Self {
        ErrorCode::Type(code)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Replace `{n}` with `args[n]`; placeholders without an argument are kept
fn format_template(template: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let substituted = after.find('}').and_then(|close| {
            let index: usize = after[..close].parse().ok()?;
            let arg = args.get(index)?;
            Some((arg, close))
        });
        match substituted {
            Some((arg, close)) => {
                out.push_str(arg);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;

    #[test]
    fn test_codes_are_unique() {
        let mut ids = FxHashSet::default();
        let mut names = FxHashSet::default();
        for code in ResolverErrorCode::ALL.iter().map(|&c| ErrorCode::from(c))
            .chain(TypeErrorCode::ALL.iter().map(|&c| ErrorCode::from(c)))
        {
            assert!(ids.insert(code.as_str()), "duplicate id {}", code.as_str());
            assert!(names.insert(code.name()), "duplicate name {}", code.name());
        }
    }

    #[test]
    fn test_resolver_and_type_prefixes() {
        assert!(ResolverErrorCode::ALL.iter().all(|c| c.as_str().starts_with("E1")));
        assert!(TypeErrorCode::ALL.iter().all(|c| c.as_str().starts_with("E2")));
    }

    #[test]
    fn test_format_substitutes_positional_args() {
        let code = ErrorCode::from(ResolverErrorCode::CannotResolveMethodInClass);
        let message = code.format(&["foo".to_string(), "A".to_string()]);
        assert_eq!(message, "cannot resolve method 'foo' in class 'A'");
    }

    #[test]
    fn test_format_repeated_and_missing_args() {
        let code = ErrorCode::from(ResolverErrorCode::DidYouMeanNew);
        assert_eq!(code.format(&["Point".to_string()]), "'Point' is a class; did you mean 'new Point()'?");
        assert_eq!(format_template("{0} and {1}", &["a".to_string()]), "a and {1}");
    }

    #[test]
    fn test_from_name() {
        assert_eq!(
            ErrorCode::from_name("shadowed-local-variable"),
            Some(ErrorCode::Resolver(ResolverErrorCode::ShadowedLocalVariable))
        );
        assert_eq!(ErrorCode::from_name("E2001"), Some(ErrorCode::Type(TypeErrorCode::NoSuchType)));
        assert_eq!(ErrorCode::from_name("no-such-code"), None);
    }

    #[test]
    fn test_warning_severities() {
        assert_eq!(ResolverErrorCode::ShadowedLocalVariable.severity(), Severity::Warning);
        assert_eq!(ResolverErrorCode::TypeVariableShadowsType.severity(), Severity::Warning);
        assert_eq!(ResolverErrorCode::DuplicateLocalVariable.severity(), Severity::Error);
    }
}
