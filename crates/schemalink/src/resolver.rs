//! Reverse-link resolution.
//!
//! After every table has been built, each outbound foreign key is reversed
//! and attached to the inbound list of the table it references.

use tracing::{debug, info, warn};

use crate::core::schema::{ForeignKeyConstraint, SchemaModel};
use crate::error::{Result, SchemaError};

/// Validate a constraint and build its reverse.
///
/// Returns the referenced table together with the reversed constraint, whose
/// parts have local and remote sides swapped. All parts must name the same
/// remote table.
pub fn reverse_constraint(
    table: &str,
    constraint: &ForeignKeyConstraint,
) -> Result<(String, ForeignKeyConstraint)> {
    let Some(remote_table) = constraint.remote_table() else {
        return Err(SchemaError::EmptyConstraint {
            table: table.to_string(),
            constraint: constraint.name.clone(),
        });
    };

    let mut reversed = ForeignKeyConstraint::new(constraint.name.clone());
    for part in &constraint.parts {
        if part.remote_table != remote_table {
            return Err(SchemaError::ConstraintConsistency {
                table: table.to_string(),
                constraint: constraint.name.clone(),
                expected: remote_table.to_string(),
                found: part.remote_table.clone(),
            });
        }
        reversed.parts.push(part.reversed());
    }

    Ok((remote_table.to_string(), reversed))
}

/// Attach the reverse of every outbound constraint to the referenced table.
///
/// All constraints are validated before any table is touched, so on error
/// the model is left as it was. A model that is already resolved is not
/// modified again.
pub fn resolve(model: &mut SchemaModel) -> Result<()> {
    if model.is_resolved() {
        warn!("Schema model already resolved, skipping");
        return Ok(());
    }

    let mut links = Vec::new();
    for table in model.tables() {
        for constraint in table.foreign_keys.values() {
            let (remote_table, reversed) = reverse_constraint(&table.name, constraint)?;
            if !model.contains(&remote_table) {
                return Err(SchemaError::UnresolvedReference {
                    table: table.name.clone(),
                    constraint: constraint.name.clone(),
                    remote_table,
                });
            }
            links.push((remote_table, reversed));
        }
    }

    let total = links.len();
    for (remote_table, reversed) in links {
        debug!("Linking {} <- {}", remote_table, reversed.name);
        if let Some(record) = model.get_mut(&remote_table) {
            record.inbound.push(reversed);
        }
    }

    let names: Vec<String> = model.table_names().into_iter().map(str::to_string).collect();
    for name in names {
        if let Some(record) = model.get_mut(&name) {
            record.inbound.sort_by(|a, b| inbound_key(a).cmp(&inbound_key(b)));
        }
    }

    model.mark_resolved();
    info!("Resolved {} inbound constraints across {} tables", total, model.len());
    Ok(())
}

/// Sort key for inbound lists: declaring table, then constraint name.
fn inbound_key(constraint: &ForeignKeyConstraint) -> (&str, &str) {
    let source = constraint
        .parts
        .first()
        .map(|p| p.remote_table.as_str())
        .unwrap_or_default();
    (source, constraint.name.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::{ConstraintPart, TableRecord};

    fn make_part(table: &str, column: &str, remote_table: &str, remote_column: &str) -> ConstraintPart {
        ConstraintPart {
            table: table.to_string(),
            column: column.to_string(),
            remote_table: remote_table.to_string(),
            remote_column: remote_column.to_string(),
        }
    }

    fn with_fk(mut table: TableRecord, name: &str, parts: Vec<ConstraintPart>) -> TableRecord {
        for part in &parts {
            table.referenced_tables.insert(part.remote_table.clone());
        }
        table.foreign_keys.insert(
            name.to_string(),
            ForeignKeyConstraint {
                name: name.to_string(),
                parts,
            },
        );
        table
    }

    fn student_registration() -> SchemaModel {
        let mut model = SchemaModel::new();
        model.insert(TableRecord::new("student"));
        model.insert(with_fk(
            TableRecord::new("registration"),
            "fk1",
            vec![make_part("registration", "student_id", "student", "id")],
        ));
        model
    }

    #[test]
    fn test_student_registration_end_to_end() {
        let mut model = student_registration();
        resolve(&mut model).unwrap();

        let student = model.get("student").unwrap();
        assert_eq!(student.inbound.len(), 1);
        assert_eq!(
            student.inbound[0].parts,
            vec![make_part("student", "id", "registration", "student_id")]
        );

        let registration = model.get("registration").unwrap();
        assert!(registration.inbound.is_empty());
        assert_eq!(
            registration.constraint("fk1").unwrap().parts,
            vec![make_part("registration", "student_id", "student", "id")]
        );
        assert!(model.is_resolved());
    }

    #[test]
    fn test_mixed_remote_tables_is_consistency_error() {
        let constraint = ForeignKeyConstraint {
            name: "fk_bad".to_string(),
            parts: vec![
                make_part("registration", "student_id", "student", "id"),
                make_part("registration", "course_id", "course", "id"),
            ],
        };
        let err = reverse_constraint("registration", &constraint).unwrap_err();
        assert!(err.is_fatal());
        match err {
            SchemaError::ConstraintConsistency {
                expected, found, ..
            } => {
                assert_eq!(expected, "student");
                assert_eq!(found, "course");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_constraint_is_rejected() {
        let err = reverse_constraint("t", &ForeignKeyConstraint::new("fk")).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(err.to_string(), "Constraint fk on table t has no columns");
    }

    #[test]
    fn test_consistency_error_leaves_model_untouched() {
        let mut model = student_registration();
        model.insert(TableRecord::new("course"));
        model.insert(with_fk(
            TableRecord::new("enrollment"),
            "fk_bad",
            vec![
                make_part("enrollment", "student_id", "student", "id"),
                make_part("enrollment", "course_id", "course", "id"),
            ],
        ));

        let err = resolve(&mut model).unwrap_err();
        assert!(matches!(err, SchemaError::ConstraintConsistency { .. }));
        assert!(model.tables().all(|t| t.inbound.is_empty()));
        assert!(!model.is_resolved());
    }

    #[test]
    fn test_missing_remote_table_is_unresolved() {
        let mut model = SchemaModel::new();
        model.insert(with_fk(
            TableRecord::new("registration"),
            "fk1",
            vec![make_part("registration", "student_id", "student", "id")],
        ));

        let err = resolve(&mut model).unwrap_err();
        match err {
            SchemaError::UnresolvedReference {
                table,
                constraint,
                remote_table,
            } => {
                assert_eq!(table, "registration");
                assert_eq!(constraint, "fk1");
                assert_eq!(remote_table, "student");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!model.is_resolved());
    }

    #[test]
    fn test_round_trip_reversal() {
        let mut model = SchemaModel::new();
        model.insert(TableRecord::new("offering"));
        model.insert(with_fk(
            TableRecord::new("grade"),
            "fk_offering",
            vec![
                make_part("grade", "course_id", "offering", "course_id"),
                make_part("grade", "term", "offering", "term_code"),
            ],
        ));
        let original = model.get("grade").unwrap().constraint("fk_offering").unwrap().clone();

        resolve(&mut model).unwrap();

        let inbound = &model.get("offering").unwrap().inbound;
        assert_eq!(inbound.len(), 1);
        let (back_to, twice) = reverse_constraint("offering", &inbound[0]).unwrap();
        assert_eq!(back_to, "grade");
        assert_eq!(twice.column_pairs(), original.column_pairs());
    }

    #[test]
    fn test_resolve_twice_does_not_duplicate() {
        let mut model = student_registration();
        resolve(&mut model).unwrap();
        resolve(&mut model).unwrap();
        assert_eq!(model.get("student").unwrap().inbound.len(), 1);
    }

    #[test]
    fn test_inbound_sorted_by_source_then_name() {
        let mut model = SchemaModel::new();
        model.insert(TableRecord::new("student"));
        model.insert(with_fk(
            TableRecord::new("registration"),
            "fk_b",
            vec![make_part("registration", "student_id", "student", "id")],
        ));
        let registration = model.get("registration").unwrap().clone();
        model.insert(with_fk(
            registration,
            "fk_a",
            vec![make_part("registration", "mentor_id", "student", "id")],
        ));
        model.insert(with_fk(
            TableRecord::new("advisor"),
            "fk_z",
            vec![make_part("advisor", "student_id", "student", "id")],
        ));

        resolve(&mut model).unwrap();

        let order: Vec<(&str, &str)> = model
            .get("student")
            .unwrap()
            .inbound
            .iter()
            .map(|c| (c.parts[0].remote_table.as_str(), c.name.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("advisor", "fk_z"),
                ("registration", "fk_a"),
                ("registration", "fk_b"),
            ]
        );
        let referencing: Vec<&str> = model
            .get("student")
            .unwrap()
            .referencing_tables()
            .into_iter()
            .collect();
        assert_eq!(referencing, vec!["advisor", "registration"]);
    }

    #[test]
    fn test_self_reference() {
        let mut model = SchemaModel::new();
        model.insert(with_fk(
            TableRecord::new("employee"),
            "fk_manager",
            vec![make_part("employee", "manager_id", "employee", "id")],
        ));
        resolve(&mut model).unwrap();
        let employee = model.get("employee").unwrap();
        assert_eq!(employee.inbound.len(), 1);
        assert_eq!(
            employee.inbound[0].parts[0],
            make_part("employee", "id", "employee", "manager_id")
        );
    }
}
