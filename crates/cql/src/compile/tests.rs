//! Compiler tests over a small hand-written schema.

use crate::{
    Condition, CqlError, Dialector, Field, FieldRef, JoinCondition, Model, Preload, Relation,
    Value, and, delete, not, or, query, unsafe_condition, update, xor,
};
use pretty_assertions::assert_eq;

struct Company;
struct Seller;
struct Product;
struct Sale;
struct Employee;
struct Phone;
struct Brand;

impl Model for Company {
    const NAME: &'static str = "Company";
    const TABLE: &'static str = "companies";

    fn fields() -> Vec<FieldRef> {
        vec![Company::id().into(), Company::name().into()]
    }
}

impl Company {
    fn id() -> Field<Company, i64> {
        Field::new("ID").read_only()
    }

    fn name() -> Field<Company, String> {
        Field::new("Name")
    }

    fn sellers() -> Relation<Company, Seller> {
        Relation::new("Sellers", "id", "company_id")
    }
}

impl Model for Seller {
    const NAME: &'static str = "Seller";
    const TABLE: &'static str = "sellers";

    fn fields() -> Vec<FieldRef> {
        vec![
            Seller::id().into(),
            Seller::name().into(),
            Seller::company_id().into(),
        ]
    }
}

impl Seller {
    fn id() -> Field<Seller, i64> {
        Field::new("ID").read_only()
    }

    fn name() -> Field<Seller, String> {
        Field::new("Name")
    }

    fn company_id() -> Field<Seller, i64> {
        Field::new("CompanyID").nullable()
    }

    fn company(conditions: Vec<Condition<Company>>) -> JoinCondition<Seller> {
        Relation::new("Company", "company_id", "id").join(conditions)
    }
}

impl Model for Product {
    const NAME: &'static str = "Product";
    const TABLE: &'static str = "products";

    fn fields() -> Vec<FieldRef> {
        vec![
            Product::id().into(),
            Product::int().into(),
            Product::float().into(),
            Product::string().into(),
            Product::bool().into(),
        ]
    }
}

impl Product {
    fn id() -> Field<Product, i64> {
        Field::new("ID").read_only()
    }

    fn int() -> Field<Product, i64> {
        Field::new("Int")
    }

    fn float() -> Field<Product, f64> {
        Field::new("Float")
    }

    fn string() -> Field<Product, String> {
        Field::new("String").column("string_something_else")
    }

    fn bool() -> Field<Product, bool> {
        Field::new("Bool")
    }
}

impl Model for Sale {
    const NAME: &'static str = "Sale";
    const TABLE: &'static str = "sales";

    fn fields() -> Vec<FieldRef> {
        vec![Sale::code().into()]
    }
}

impl Sale {
    fn code() -> Field<Sale, i64> {
        Field::new("Code")
    }

    fn product(conditions: Vec<Condition<Product>>) -> JoinCondition<Sale> {
        Relation::new("Product", "product_id", "id").join(conditions)
    }

    fn seller(conditions: Vec<Condition<Seller>>) -> JoinCondition<Sale> {
        Relation::new("Seller", "seller_id", "id").join(conditions)
    }
}

impl Model for Employee {
    const NAME: &'static str = "Employee";
    const TABLE: &'static str = "employees";

    fn fields() -> Vec<FieldRef> {
        vec![Employee::name().into()]
    }
}

impl Employee {
    fn name() -> Field<Employee, String> {
        Field::new("Name")
    }

    fn boss(conditions: Vec<Condition<Employee>>) -> JoinCondition<Employee> {
        Relation::new("Boss", "boss_id", "id").join(conditions)
    }
}

impl Model for Phone {
    const NAME: &'static str = "Phone";
    const TABLE: &'static str = "phones";
    const DELETED_AT: Option<&'static str> = Some("deleted_at");

    fn fields() -> Vec<FieldRef> {
        vec![Phone::name().into()]
    }
}

impl Phone {
    fn name() -> Field<Phone, String> {
        Field::new("Name")
    }

    fn deleted_at() -> Field<Phone, chrono::DateTime<chrono::Utc>> {
        Field::new("DeletedAt").nullable()
    }

    fn brand(conditions: Vec<Condition<Brand>>) -> JoinCondition<Phone> {
        Relation::new("Brand", "brand_id", "id").join(conditions)
    }
}

impl Model for Brand {
    const NAME: &'static str = "Brand";
    const TABLE: &'static str = "brands";

    fn fields() -> Vec<FieldRef> {
        vec![Brand::name().into()]
    }
}

impl Brand {
    fn name() -> Field<Brand, String> {
        Field::new("Name")
    }

    fn phone(conditions: Vec<Condition<Phone>>) -> JoinCondition<Brand> {
        Relation::new("Phone", "id", "brand_id").join(conditions)
    }

    fn phones() -> Relation<Brand, Phone> {
        Relation::new("Phones", "id", "brand_id")
    }
}

fn where_sql<M: Model>(conditions: Vec<Condition<M>>, dialector: Dialector) -> String {
    query::<M>(conditions).compile(dialector).unwrap().sql
}

// ==================== Field conditions ====================

#[test]
fn test_field_condition() {
    let stmt = query::<Product>(vec![Product::int().eq(1).into()])
        .compile(Dialector::Postgres)
        .unwrap();
    assert_eq!(stmt.sql, "SELECT products.* FROM products WHERE (products.int = ?)");
    assert_eq!(stmt.params, vec![Value::Int(1)]);
}

#[test]
fn test_top_level_conditions_are_anded() {
    let sql = where_sql::<Product>(
        vec![
            Product::int().gt(1).into(),
            Product::string().eq("a").into(),
        ],
        Dialector::Sqlite,
    );
    assert_eq!(
        sql,
        "SELECT products.* FROM products WHERE (products.int > ? AND products.string_something_else = ?)"
    );
}

#[test]
fn test_value_shapes() {
    let sql = where_sql::<Product>(
        vec![
            Product::int().between(1, 5).into(),
            Product::int().in_list([1, 2, 3]).unwrap().into(),
            Product::float().is_null().into(),
            Product::bool().ne(true).into(),
        ],
        Dialector::Postgres,
    );
    assert!(sql.contains("products.int BETWEEN ? AND ?"));
    assert!(sql.contains("products.int IN (?, ?, ?)"));
    assert!(sql.contains("products.float IS NULL"));
    assert!(sql.contains("products.bool <> ?"));
}

#[test]
fn test_like_escape() {
    let stmt = query::<Product>(vec![Product::string().like_escape("a\\_%", '\\').into()])
        .compile(Dialector::MySql)
        .unwrap();
    assert!(stmt.sql.ends_with("WHERE (products.string_something_else LIKE ? ESCAPE ?)"));
    assert_eq!(
        stmt.params,
        vec![Value::from("a\\_%"), Value::from("\\")]
    );
}

#[test]
fn test_dialect_restricted_operator() {
    let sql = where_sql::<Product>(vec![Product::string().ilike("a%").into()], Dialector::Postgres);
    assert!(sql.ends_with("WHERE (products.string_something_else ILIKE ?)"));

    let err = query::<Product>(vec![Product::string().ilike("a%").into()])
        .compile(Dialector::Sqlite)
        .unwrap_err();
    assert_eq!(
        err,
        CqlError::UnsupportedOperatorForDialect {
            name: "psql.ILike",
            dialector: Dialector::Sqlite,
        }
    );

    let sql = where_sql::<Product>(vec![Product::string().glob("a*").into()], Dialector::Sqlite);
    assert!(sql.ends_with("WHERE (products.string_something_else GLOB ?)"));
}

#[test]
fn test_is_distinct_per_dialect() {
    let sql = where_sql::<Product>(vec![Product::int().is_distinct(1).into()], Dialector::MySql);
    assert!(sql.ends_with("WHERE (NOT products.int <=> ?)"));

    let sql = where_sql::<Product>(vec![Product::int().is_not_distinct(1).into()], Dialector::MySql);
    assert!(sql.ends_with("WHERE (products.int <=> ?)"));

    let sql = where_sql::<Product>(vec![Product::int().is_distinct(1).into()], Dialector::Postgres);
    assert!(sql.ends_with("WHERE (products.int IS DISTINCT FROM ?)"));
}

// ==================== Functions ====================

#[test]
fn test_infix_function_params_come_first() {
    let stmt = query::<Product>(vec![Product::int().plus(1).eq(2).into()])
        .compile(Dialector::Postgres)
        .unwrap();
    assert!(stmt.sql.ends_with("WHERE ((products.int + ?) = ?)"));
    assert_eq!(stmt.params, vec![Value::Int(1), Value::Int(2)]);
}

#[test]
fn test_function_strategies_per_dialect() {
    let power = || vec![Product::int().power(2).eq(4).into()];
    assert!(where_sql::<Product>(power(), Dialector::Postgres).ends_with("((products.int ^ ?) = ?)"));
    assert!(where_sql::<Product>(power(), Dialector::MySql).ends_with("(POWER(products.int, ?) = ?)"));

    let sqrt = || vec![Product::float().square_root().eq(2.0).into()];
    assert!(where_sql::<Product>(sqrt(), Dialector::Postgres).ends_with("(|/products.float = ?)"));
    assert!(where_sql::<Product>(sqrt(), Dialector::Sqlite).ends_with("(SQRT(products.float) = ?)"));

    let concat = || vec![Product::string().concat("x").eq("ax").into()];
    assert!(
        where_sql::<Product>(concat(), Dialector::Postgres)
            .ends_with("((products.string_something_else || ?) = ?)")
    );
    assert!(
        where_sql::<Product>(concat(), Dialector::SqlServer)
            .ends_with("(CONCAT(products.string_something_else, ?) = ?)")
    );
}

#[test]
fn test_prefix_function_binds_nothing() {
    let stmt = query::<Product>(vec![Product::int().absolute().eq(3).into()])
        .compile(Dialector::Postgres)
        .unwrap();
    assert!(stmt.sql.ends_with("(@products.int = ?)"));
    assert_eq!(stmt.params, vec![Value::Int(3)]);
}

#[test]
fn test_bit_xor_unsupported_on_sqlite() {
    let err = query::<Product>(vec![Product::int().bit_xor(1).eq(0).into()])
        .compile(Dialector::Sqlite)
        .unwrap_err();
    assert_eq!(err, CqlError::unsupported("BitXor", Dialector::Sqlite));
}

// ==================== Connectors ====================

#[test]
fn test_connectors_are_parenthesized() {
    let sql = where_sql::<Product>(
        vec![
            or(vec![
                Product::int().eq(1),
                and(vec![Product::int().gt(2), Product::bool().eq(true)]),
            ])
            .into(),
        ],
        Dialector::Postgres,
    );
    assert!(sql.ends_with("WHERE ((products.int = ? OR (products.int > ? AND products.bool = ?)))"));
}

#[test]
fn test_not_wraps_an_and() {
    let cond = not(vec![Product::int().eq(1), Product::int().eq(2)]).unwrap();
    let sql = where_sql::<Product>(vec![cond.into()], Dialector::Postgres);
    assert!(sql.ends_with("WHERE ((NOT (products.int = ? AND products.int = ?)))"));
}

#[test]
fn test_not_requires_conditions() {
    let err = not::<Product>(vec![]).unwrap_err();
    assert!(matches!(err, CqlError::MalformedConditionTree(_)));
}

#[test]
fn test_empty_connectors_are_skipped() {
    let sql = where_sql::<Product>(
        vec![and::<Product>(vec![]).into(), Product::int().eq(1).into()],
        Dialector::Postgres,
    );
    assert_eq!(sql, "SELECT products.* FROM products WHERE (products.int = ?)");

    let sql = where_sql::<Product>(vec![or::<Product>(vec![]).into()], Dialector::Postgres);
    assert_eq!(sql, "SELECT products.* FROM products");
}

#[test]
fn test_xor_is_mysql_only() {
    let cond = || xor(Product::int().eq(1), vec![Product::int().eq(2)]);
    let sql = where_sql::<Product>(vec![cond().into()], Dialector::MySql);
    assert!(sql.ends_with("WHERE ((products.int = ? XOR products.int = ?))"));

    let err = query::<Product>(vec![cond().into()])
        .compile(Dialector::Postgres)
        .unwrap_err();
    assert_eq!(err, CqlError::unsupported("mysql.Xor", Dialector::Postgres));
}

#[test]
fn test_nesting_is_balanced() {
    let mut cond = Product::int().eq(0);
    for depth in 1..=5 {
        cond = if depth % 2 == 0 {
            and(vec![cond, Product::int().gt(depth)])
        } else {
            or(vec![cond, Product::int().lt(depth)])
        };
        let sql = where_sql::<Product>(vec![cond.clone().into()], Dialector::Postgres);
        let opened = sql.matches('(').count();
        let closed = sql.matches(')').count();
        assert_eq!(opened, closed, "depth {depth}: {sql}");
        // One pair for the WHERE clause plus one per connector.
        assert_eq!(opened, depth as usize + 1, "depth {depth}: {sql}");
    }
}

// ==================== Joins ====================

#[test]
fn test_join_with_nested_condition() {
    let stmt = query::<Seller>(vec![
        Seller::company(vec![Company::name().eq("Acme").into()]).into(),
    ])
    .compile(Dialector::Postgres)
    .unwrap();
    assert_eq!(
        stmt.sql,
        "SELECT sellers.* FROM sellers \
         INNER JOIN companies company ON company.id = sellers.company_id \
         WHERE (company.name = ?)"
    );
    assert_eq!(stmt.params, vec![Value::from("Acme")]);
}

#[test]
fn test_nested_join_aliases() {
    let stmt = query::<Sale>(vec![
        Sale::seller(vec![
            Seller::company(vec![Company::name().is_dynamic().eq(Seller::name()).into()]).into(),
        ])
        .into(),
    ])
    .compile(Dialector::Postgres)
    .unwrap();
    assert_eq!(
        stmt.sql,
        "SELECT sales.* FROM sales \
         INNER JOIN sellers seller ON seller.id = sales.seller_id \
         INNER JOIN companies seller__company ON seller__company.id = seller.company_id \
         WHERE (seller__company.name = seller.name)"
    );
    assert!(stmt.params.is_empty());
}

#[test]
fn test_dynamic_reference_to_root() {
    let sql = where_sql::<Seller>(
        vec![Seller::company(vec![Company::name().is_dynamic().eq(Seller::name()).into()]).into()],
        Dialector::MySql,
    );
    assert!(sql.ends_with("WHERE (company.name = sellers.name)"));
}

#[test]
fn test_join_is_visible_to_siblings() {
    let sql = where_sql::<Sale>(
        vec![
            Sale::product(vec![]).into(),
            Sale::code().is_dynamic().eq(Product::int()).into(),
        ],
        Dialector::Postgres,
    );
    assert_eq!(
        sql,
        "SELECT sales.* FROM sales \
         INNER JOIN products product ON product.id = sales.product_id \
         WHERE (sales.code = product.int)"
    );
}

#[test]
fn test_unjoined_reference_falls_back_to_table() {
    let sql = where_sql::<Product>(
        vec![Product::string().is_dynamic().eq(Seller::name()).into()],
        Dialector::Postgres,
    );
    assert!(sql.ends_with("WHERE (products.string_something_else = sellers.name)"));
}

#[test]
fn test_appearance_selects_join() {
    let ambiguous = query::<Employee>(vec![
        Employee::boss(vec![Employee::name().is_dynamic().eq(Employee::name()).into()]).into(),
    ])
    .compile(Dialector::Postgres)
    .unwrap_err();
    assert_eq!(
        ambiguous,
        CqlError::AmbiguousModelReference {
            model: "Employee",
            joins: 2,
        }
    );

    let sql = where_sql::<Employee>(
        vec![
            Employee::boss(vec![
                Employee::name()
                    .is_dynamic()
                    .eq(Employee::name().appearance(0))
                    .into(),
            ])
            .into(),
        ],
        Dialector::Postgres,
    );
    assert_eq!(
        sql,
        "SELECT employees.* FROM employees \
         INNER JOIN employees boss ON boss.id = employees.boss_id \
         WHERE (boss.name = employees.name)"
    );

    let err = query::<Employee>(vec![
        Employee::boss(vec![
            Employee::name()
                .is_dynamic()
                .eq(Employee::name().appearance(5))
                .into(),
        ])
        .into(),
    ])
    .compile(Dialector::Postgres)
    .unwrap_err();
    assert_eq!(
        err,
        CqlError::AppearanceOutOfRange {
            model: "Employee",
            appearance: 5,
            joins: 2,
        }
    );
}

// ==================== Preloads ====================

#[test]
fn test_preload_uses_left_join() {
    let stmt = query::<Seller>(vec![Seller::company(vec![]).preload().into()])
        .compile(Dialector::Postgres)
        .unwrap();
    assert_eq!(
        stmt.sql,
        "SELECT sellers.*, company.id AS \"company__id\", company.name AS \"company__name\" \
         FROM sellers LEFT JOIN companies company ON company.id = sellers.company_id"
    );
    assert_eq!(
        stmt.preloads,
        vec![Preload::Joined {
            model: "Company",
            alias: "company".to_string(),
            columns: vec!["id".to_string(), "name".to_string()],
        }]
    );
}

#[test]
fn test_preload_with_filter_uses_inner_join() {
    let stmt = query::<Seller>(vec![
        Seller::company(vec![Company::name().eq("Acme").into()])
            .preload()
            .into(),
    ])
    .compile(Dialector::MySql)
    .unwrap();
    assert!(stmt.sql.contains("company.name AS `company__name`"));
    assert!(stmt.sql.contains("INNER JOIN companies company"));
    assert!(stmt.sql.ends_with("WHERE (company.name = ?)"));
}

#[test]
fn test_nested_preload_preloads_intermediate_model() {
    let stmt = query::<Sale>(vec![
        Sale::seller(vec![Seller::company(vec![]).preload().into()]).into(),
    ])
    .compile(Dialector::Postgres)
    .unwrap();
    assert!(stmt.sql.contains("seller.company_id AS \"seller__company_id\""));
    assert!(stmt.sql.contains("seller__company.name AS \"seller__company__name\""));
    assert!(stmt.sql.contains("LEFT JOIN sellers seller ON seller.id = sales.seller_id"));
    assert!(stmt.sql.contains(
        "LEFT JOIN companies seller__company ON seller__company.id = seller.company_id"
    ));

    let aliases: Vec<&str> = stmt
        .preloads
        .iter()
        .filter_map(|p| match p {
            Preload::Joined { alias, .. } => Some(alias.as_str()),
            Preload::Collection { .. } => None,
        })
        .collect();
    assert_eq!(aliases, vec!["seller", "seller__company"]);
}

#[test]
fn test_preload_subset_of_fields() {
    let preload = Condition::<Company>::preload_fields(vec![Company::name().into()]).unwrap();
    let stmt = query::<Seller>(vec![Seller::company(vec![preload]).into()])
        .compile(Dialector::Postgres)
        .unwrap();
    assert_eq!(
        stmt.sql,
        "SELECT sellers.*, company.name AS \"company__name\" \
         FROM sellers LEFT JOIN companies company ON company.id = sellers.company_id"
    );
}

#[test]
fn test_preload_fields_must_belong_to_model() {
    let err = Condition::<Company>::preload_fields(vec![Seller::name().into()]).unwrap_err();
    assert!(matches!(err, CqlError::MalformedConditionTree(_)));
}

#[test]
fn test_collection_preload() {
    let stmt = query::<Company>(vec![
        Company::sellers()
            .preload_collection(vec![Seller::company(vec![]).preload()])
            .unwrap(),
    ])
    .compile(Dialector::Postgres)
    .unwrap();
    assert_eq!(stmt.sql, "SELECT companies.* FROM companies");
    assert_eq!(
        stmt.preloads,
        vec![
            Preload::Collection {
                model: "Seller",
                path: "Sellers".to_string(),
            },
            Preload::Collection {
                model: "Company",
                path: "Sellers.Company".to_string(),
            },
        ]
    );
}

#[test]
fn test_collection_preload_rejects_filters() {
    let err = Company::sellers()
        .preload_collection(vec![
            Seller::company(vec![Company::name().eq("Acme").into()]).preload(),
        ])
        .unwrap_err();
    assert!(err.to_string().contains("only preloads are allowed"));

    assert!(
        Company::sellers()
            .preload_collection(vec![Seller::company(vec![])])
            .is_err()
    );
}

// ==================== Collection predicates ====================

#[test]
fn test_any_compiles_to_exists() {
    let stmt = query::<Company>(vec![
        Company::sellers()
            .any(vec![Seller::name().eq("Acme")])
            .unwrap()
            .into(),
    ])
    .compile(Dialector::Postgres)
    .unwrap();
    assert_eq!(
        stmt.sql,
        "SELECT companies.* FROM companies WHERE (EXISTS (SELECT 1 FROM sellers sellers \
         WHERE sellers.company_id = companies.id AND sellers.name = ?))"
    );
    assert_eq!(stmt.params, vec![Value::from("Acme")]);
}

#[test]
fn test_none_and_all_negate_exists() {
    let sql = where_sql::<Company>(
        vec![Company::sellers().none(vec![Seller::name().eq("a")]).unwrap().into()],
        Dialector::Postgres,
    );
    assert_eq!(
        sql,
        "SELECT companies.* FROM companies WHERE ((NOT (EXISTS (SELECT 1 FROM sellers sellers \
         WHERE sellers.company_id = companies.id AND sellers.name = ?))))"
    );

    let sql = where_sql::<Company>(
        vec![Company::sellers().all(vec![Seller::name().eq("a")]).unwrap().into()],
        Dialector::Postgres,
    );
    assert_eq!(
        sql,
        "SELECT companies.* FROM companies WHERE ((NOT (EXISTS (SELECT 1 FROM sellers sellers \
         WHERE sellers.company_id = companies.id AND (NOT (sellers.name = ?))))))"
    );
}

#[test]
fn test_exists_filters_soft_deleted_rows() {
    let sql = where_sql::<Brand>(
        vec![Brand::phones().any(vec![Phone::name().eq("x")]).unwrap().into()],
        Dialector::Sqlite,
    );
    assert_eq!(
        sql,
        "SELECT brands.* FROM brands WHERE (EXISTS (SELECT 1 FROM phones phones \
         WHERE phones.brand_id = brands.id AND phones.name = ? AND phones.deleted_at IS NULL))"
    );

    let sql = where_sql::<Brand>(
        vec![Brand::phones().any(vec![Phone::deleted_at().is_not_null()]).unwrap().into()],
        Dialector::Sqlite,
    );
    assert!(sql.ends_with("AND phones.deleted_at IS NOT NULL))"));
}

#[test]
fn test_exists_combines_with_connectors() {
    let sql = where_sql::<Company>(
        vec![
            or(vec![
                Company::name().eq("a"),
                Company::sellers().any(vec![Seller::name().eq("b")]).unwrap(),
            ])
            .into(),
        ],
        Dialector::MySql,
    );
    assert_eq!(
        sql,
        "SELECT companies.* FROM companies WHERE ((companies.name = ? OR EXISTS (SELECT 1 \
         FROM sellers sellers WHERE sellers.company_id = companies.id AND sellers.name = ?)))"
    );
}

#[test]
fn test_collection_predicates_require_conditions() {
    let err = Company::sellers().any(vec![]).unwrap_err();
    assert!(matches!(err, CqlError::MalformedConditionTree(_)));
    assert!(err.to_string().contains("any over Company.Sellers"));
    assert!(Company::sellers().all(vec![]).is_err());
}

// ==================== Unsafe ====================

#[test]
fn test_unsafe_condition_substitutes_table() {
    let stmt = query::<Seller>(vec![
        Seller::company(vec![
            unsafe_condition::<Company>("{table}.name = ? OR {table}.id > ?", vec![
                "Acme".into(),
                5.into(),
            ])
            .into(),
        ])
        .into(),
    ])
    .compile(Dialector::Postgres)
    .unwrap();
    assert!(stmt.sql.ends_with("WHERE (company.name = ? OR company.id > ?)"));
    assert_eq!(stmt.params, vec![Value::from("Acme"), Value::Int(5)]);
}

#[test]
fn test_unsafe_field_accepts_any_operand() {
    let stmt = query::<Product>(vec![Product::int().is_unsafe().eq("3").into()])
        .compile(Dialector::Sqlite)
        .unwrap();
    assert!(stmt.sql.ends_with("WHERE (products.int = ?)"));
    assert_eq!(stmt.params, vec![Value::from("3")]);

    let sql = where_sql::<Product>(
        vec![Product::int().is_unsafe().eq(Product::float()).into()],
        Dialector::Sqlite,
    );
    assert!(sql.ends_with("WHERE (products.int = products.float)"));
}

// ==================== Soft delete ====================

#[test]
fn test_soft_deleted_rows_are_filtered() {
    let sql = where_sql::<Phone>(vec![Phone::name().eq("x").into()], Dialector::Postgres);
    assert_eq!(
        sql,
        "SELECT phones.* FROM phones WHERE (phones.name = ? AND phones.deleted_at IS NULL)"
    );

    let sql = where_sql::<Phone>(vec![Phone::deleted_at().is_not_null().into()], Dialector::Postgres);
    assert_eq!(
        sql,
        "SELECT phones.* FROM phones WHERE (phones.deleted_at IS NOT NULL)"
    );

    let sql = where_sql::<Brand>(vec![Brand::phone(vec![]).into()], Dialector::Postgres);
    assert_eq!(
        sql,
        "SELECT brands.* FROM brands \
         INNER JOIN phones phone ON phone.brand_id = brands.id AND phone.deleted_at IS NULL"
    );
}

// ==================== Ordering and pagination ====================

#[test]
fn test_order_limit_offset() {
    let stmt = query::<Product>(vec![])
        .descending(Product::int())
        .limit(10)
        .offset(20)
        .compile(Dialector::Postgres)
        .unwrap();
    assert_eq!(
        stmt.sql,
        "SELECT products.* FROM products ORDER BY products.int DESC LIMIT 10 OFFSET 20"
    );
}

#[test]
fn test_order_by_joined_field() {
    let stmt = query::<Seller>(vec![Seller::company(vec![]).into()])
        .ascending(Company::name())
        .compile(Dialector::Sqlite)
        .unwrap();
    assert!(stmt.sql.ends_with("ORDER BY company.name ASC"));
}

#[test]
fn test_pagination_per_dialect() {
    let stmt = query::<Product>(vec![]).limit(5).compile(Dialector::SqlServer).unwrap();
    assert_eq!(
        stmt.sql,
        "SELECT products.* FROM products ORDER BY (SELECT NULL) OFFSET 0 ROWS FETCH NEXT 5 ROWS ONLY"
    );

    let stmt = query::<Product>(vec![]).offset(3).compile(Dialector::MySql).unwrap();
    assert_eq!(
        stmt.sql,
        "SELECT products.* FROM products LIMIT 18446744073709551615 OFFSET 3"
    );

    let stmt = query::<Product>(vec![]).offset(3).compile(Dialector::Sqlite).unwrap();
    assert_eq!(stmt.sql, "SELECT products.* FROM products LIMIT -1 OFFSET 3");
}

// ==================== Update / delete ====================

#[test]
fn test_update_sets_before_filter() {
    let stmt = update::<Product>(vec![Product::int().eq(1).into()])
        .set(Product::string(), "x")
        .unwrap()
        .compile(Dialector::Postgres)
        .unwrap();
    assert_eq!(
        stmt.sql,
        "UPDATE products SET string_something_else = ? WHERE (products.int = ?)"
    );
    assert_eq!(stmt.params, vec![Value::from("x"), Value::Int(1)]);
    assert_eq!(
        stmt.native_sql(),
        "UPDATE products SET string_something_else = $1 WHERE (products.int = $2)"
    );
}

#[test]
fn test_update_rejects_read_only_field() {
    let err = update::<Product>(vec![]).set(Product::id(), 3).unwrap_err();
    assert!(err.to_string().contains("Product.ID is not updatable"));

    let err = update::<Product>(vec![]).compile(Dialector::Postgres).unwrap_err();
    assert!(matches!(err, CqlError::MalformedConditionTree(_)));
}

#[test]
fn test_update_with_join_per_dialect() {
    let statement = update::<Seller>(vec![
        Seller::company(vec![Company::name().eq("A").into()]).into(),
    ])
    .set(Seller::name(), "B")
    .unwrap();

    let stmt = statement.compile(Dialector::Postgres).unwrap();
    assert_eq!(
        stmt.sql,
        "UPDATE sellers SET name = ? FROM companies company \
         WHERE company.id = sellers.company_id AND (company.name = ?)"
    );
    assert_eq!(stmt.params, vec![Value::from("B"), Value::from("A")]);

    let sql = statement.compile(Dialector::SqlServer).unwrap().sql;
    assert!(sql.starts_with("UPDATE sellers SET name = ? FROM companies company WHERE"));

    let stmt = statement.compile(Dialector::MySql).unwrap();
    assert_eq!(
        stmt.sql,
        "UPDATE sellers INNER JOIN companies company ON company.id = sellers.company_id \
         SET sellers.name = ? WHERE (company.name = ?)"
    );
    assert_eq!(stmt.params, vec![Value::from("B"), Value::from("A")]);
}

#[test]
fn test_update_set_dynamic_and_null() {
    let stmt = update::<Seller>(vec![Seller::company(vec![]).into()])
        .set_dynamic(Seller::name(), Company::name())
        .unwrap()
        .compile(Dialector::Postgres)
        .unwrap();
    assert_eq!(
        stmt.sql,
        "UPDATE sellers SET name = company.name FROM companies company \
         WHERE company.id = sellers.company_id"
    );

    let stmt = update::<Seller>(vec![Seller::name().eq("a").into()])
        .set_null(Seller::company_id())
        .unwrap()
        .compile(Dialector::Sqlite)
        .unwrap();
    assert_eq!(
        stmt.sql,
        "UPDATE sellers SET company_id = NULL WHERE (sellers.name = ?)"
    );

    let err = update::<Seller>(vec![]).set_null(Seller::name()).unwrap_err();
    assert!(err.to_string().contains("Seller.Name is not nullable"));
}

#[test]
fn test_update_set_multiple_is_mysql_only() {
    let statement = update::<Seller>(vec![Seller::company(vec![]).into()])
        .set_multiple(vec![
            Seller::name().assign("s"),
            Company::name().assign_dynamic(Seller::name()),
        ])
        .unwrap();

    let stmt = statement.compile(Dialector::MySql).unwrap();
    assert_eq!(
        stmt.sql,
        "UPDATE sellers INNER JOIN companies company ON company.id = sellers.company_id \
         SET sellers.name = ?, company.name = sellers.name"
    );
    assert_eq!(stmt.params, vec![Value::from("s")]);

    let err = statement.compile(Dialector::Postgres).unwrap_err();
    assert_eq!(
        err,
        CqlError::UnsupportedOperatorForDialect {
            name: "set_multiple",
            dialector: Dialector::Postgres,
        }
    );

    let err = update::<Seller>(vec![])
        .set_multiple(vec![Company::id().assign(1)])
        .unwrap_err();
    assert!(err.to_string().contains("Company.ID is not updatable"));
}

#[test]
fn test_delete_with_join_per_dialect() {
    let statement = delete::<Seller>(vec![
        Seller::company(vec![Company::name().eq("A").into()]).into(),
    ]);

    assert_eq!(
        statement.compile(Dialector::Postgres).unwrap().sql,
        "DELETE FROM sellers USING companies company \
         WHERE company.id = sellers.company_id AND (company.name = ?)"
    );
    assert_eq!(
        statement.compile(Dialector::MySql).unwrap().sql,
        "DELETE sellers FROM sellers \
         INNER JOIN companies company ON company.id = sellers.company_id \
         WHERE (company.name = ?)"
    );
    assert_eq!(
        statement.compile(Dialector::Sqlite).unwrap().sql,
        "DELETE FROM sellers WHERE sellers.id IN (SELECT sellers.id FROM sellers \
         INNER JOIN companies company ON company.id = sellers.company_id \
         WHERE (company.name = ?))"
    );
}

#[test]
fn test_soft_delete_with_join_on_mysql() {
    let stmt = delete::<Phone>(vec![Phone::brand(vec![Brand::name().eq("x").into()]).into()])
        .compile(Dialector::MySql)
        .unwrap();
    assert_eq!(
        stmt.sql,
        "UPDATE phones INNER JOIN brands brand ON brand.id = phones.brand_id \
         SET phones.deleted_at = CURRENT_TIMESTAMP \
         WHERE (brand.name = ? AND phones.deleted_at IS NULL)"
    );
}

#[test]
fn test_delete() {
    let stmt = delete::<Product>(vec![Product::int().eq(1).into()])
        .compile(Dialector::MySql)
        .unwrap();
    assert_eq!(stmt.sql, "DELETE FROM products WHERE (products.int = ?)");

    let err = delete::<Product>(vec![]).compile(Dialector::MySql).unwrap_err();
    assert!(matches!(err, CqlError::MalformedConditionTree(_)));
}

#[test]
fn test_soft_delete() {
    let stmt = delete::<Phone>(vec![Phone::name().eq("x").into()])
        .compile(Dialector::Postgres)
        .unwrap();
    assert_eq!(
        stmt.sql,
        "UPDATE phones SET deleted_at = CURRENT_TIMESTAMP \
         WHERE (phones.name = ? AND phones.deleted_at IS NULL)"
    );
}

// ==================== Statement ====================

#[test]
fn test_native_placeholders() {
    let stmt = query::<Product>(vec![Product::int().between(1, 2).into()])
        .compile(Dialector::SqlServer)
        .unwrap();
    assert!(stmt.native_sql().ends_with("products.int BETWEEN @p1 AND @p2)"));
}

#[test]
fn test_condition_to_sql() {
    let (sql, params) = Seller::name().eq("Acme").to_sql(Dialector::Postgres).unwrap();
    assert_eq!(sql, "(sellers.name = ?)");
    assert_eq!(params, vec![Value::from("Acme")]);
}

#[test]
fn test_compilation_is_deterministic() {
    let q = query::<Sale>(vec![
        Sale::seller(vec![Seller::company(vec![Company::name().eq("a").into()]).preload().into()])
            .into(),
        or(vec![Sale::code().eq(1), Sale::code().gt(10)]).into(),
    ])
    .ascending(Sale::code());

    for dialector in Dialector::ALL {
        let first = q.compile(dialector).unwrap();
        let second = q.compile(dialector).unwrap();
        assert_eq!(first, second);
    }
}
