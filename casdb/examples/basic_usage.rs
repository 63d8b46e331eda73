use casdb::{CasResult, Session};

pub fn main() -> CasResult<()> {
    flexi_logger::Logger::try_with_str("info")
        .unwrap()
        .start()
        .unwrap();

    let session = Session::new("cas://public:@localhost:33000/demodb")?;

    session.batch_execute(&["create table foo_square (f1 int primary key, f2 int)".to_string()])?;

    let inserts: Vec<String> = (0..10)
        .map(|i| format!("insert into foo_square (f1, f2) values ({i}, {})", i * i))
        .collect();
    session.batch_execute(&inserts)?;

    for row in session.query("select f1, f2 from foo_square order by f1 asc")? {
        let row = row?;
        println!("{:?}", row.values());
    }

    session.close()
}
