use contractor_core::{analyze, utils::format_error};

fn main() {
    let contract = r#"
@CreateConstructor
@Data
model LoginDTO {
  @Private
  @Optional
  @IsEmail("Invalid email")
  String email

  String password
}
"#;

    match analyze(contract, "login.contract") {
        Ok(result) => {
            println!("Checked contract:\n{}", result.program);
            match result.to_json() {
                Ok(json) => println!("Schema:\n{json}"),
                Err(e) => eprintln!("Failed to serialize schema: {e}"),
            }
        }
        Err(e) => {
            eprintln!("{}", format_error(&e, contract));
        }
    }

    // A broken contract, rendered through miette.
    let broken = "model Team {\n  Array<User> members\n}\n";
    if let Err(e) = analyze(broken, "team.contract") {
        eprintln!("{:?}", miette::Report::new(e));
    }
}
