/// The impurity molecules tracked in dense CO₂ and a fixed-size concentration vector
/// of flow quantities (mol/h) indexed by molecule. Values are kept nonnegative.
pub mod molecules;
/// eng
/// Parsing of chemical formulae into atomic composition, molar masses and the matrix of
/// atomic composition of a set of substances. Used to check that reaction equations
/// are balanced element by element.
/// ----------------------------------------------------------------
/// # Examples
/// ```
/// use CO2Spec::Kinetics::molmass::calculate_molar_mass;
/// let (molar_mass, composition) = calculate_molar_mass("H2SO4").unwrap();
/// assert!((molar_mass - 98.07).abs() < 1e-2);
/// assert_eq!(composition["O"], 4);
/// ```
pub mod molmass;
/// Irreversible reaction equations with integer stoichiometric coefficients:
/// parsing from text ("H2S + 3 NO2 -> SO2 + H2O + 3 NO"), the multiplier
/// (how far a reaction can proceed with the available reactants) and application
/// of a reaction to a concentration vector.
pub mod reaction;
/// Ordered reaction table. Order of the table is the priority order of the solver.
/// Contains the built-in catalogue of impurity reactions in dense CO₂
/// # Examples
/// ```
/// use CO2Spec::Kinetics::reaction_table::ReactionTable;
/// let table = ReactionTable::co2_impurities().unwrap();
/// assert_eq!(table.scan_order(), vec![3, 2, 1, 4, 6]);
/// ```
pub mod reaction_table;
/// Greedy priority solver: applies the first applicable reaction, restarts the scan,
/// stops when nothing can proceed. Returns the final state and the step-by-step trace.
pub mod reaction_solver;
