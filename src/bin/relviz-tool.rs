use std::env::args_os;

use serde_json::{to_string_pretty, Value};
use relviz::cmd_pipeline::{builder::build_pipeline, parser::OutputFormat, PipelineValues};
use relviz::logging::init_logging;

fn print_value(value: &Value, output_format: &OutputFormat) {
    if *output_format == OutputFormat::Concise {
        println!("{}", value);
    } else if let Ok(pretty) = to_string_pretty(value) {
        println!("{}", pretty);
    }
}

#[tokio::main]
async fn main() {
    init_logging();

    let os_args: Vec<String> = args_os()
        .map(|os| os.into_string().unwrap_or("".to_string()))
        .collect();

    if os_args.len() < 2 {
        eprintln!("Usage: {} '<pipeline string>'", os_args[0]);
        std::process::exit(1);
    }

    let (pipeline, output_format) = match build_pipeline(&os_args[0], &os_args[1]) {
        Ok(pipeline) => pipeline,
        Err(err) => {
            panic!("You did not specify a good pipeline!\n {:?}", err);
        }
    };

    match pipeline.run(false).await {
        Ok(PipelineValues::Void) => {
            println!("Void result.");
        }
        Ok(PipelineValues::HierarchyForest(forest)) => {
            print_value(&forest.to_value(), &output_format);
        }
        Ok(PipelineValues::VisNetwork(network)) => {
            print_value(&network.to_presentation(), &output_format);
        }
        Err(err) => {
            println!("Pipeline Error!");
            println!("{:?}", err);
        }
    }
}
