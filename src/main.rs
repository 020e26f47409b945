use minish::Interpreter;

fn main() -> rustyline::Result<()> {
    println!("welcome to minish");
    println!("type 'exit' or press Ctrl-D to leave");

    Interpreter::default().repl()
}
