#![allow(dead_code)]

use buildrunner::config::{Build, GeneratorTask, GnStage, NinjaStage, TestTask};

/// Builder for [`Build`] descriptors to simplify test setup.
pub struct BuildBuilder {
    build: Build,
}

impl BuildBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            build: Build {
                name: name.to_string(),
                drone_dimensions: Vec::new(),
                gn: GnStage { args: Vec::new() },
                ninja: NinjaStage {
                    config: name.to_string(),
                    targets: Vec::new(),
                },
                generators: Vec::new(),
                tests: Vec::new(),
            },
        }
    }

    pub fn drone_dimension(mut self, dim: &str) -> Self {
        self.build.drone_dimensions.push(dim.to_string());
        self
    }

    pub fn gn_arg(mut self, arg: &str) -> Self {
        self.build.gn.args.push(arg.to_string());
        self
    }

    pub fn ninja_config(mut self, config: &str) -> Self {
        self.build.ninja.config = config.to_string();
        self
    }

    pub fn ninja_target(mut self, target: &str) -> Self {
        self.build.ninja.targets.push(target.to_string());
        self
    }

    pub fn generator(mut self, task: GeneratorTask) -> Self {
        self.build.generators.push(task);
        self
    }

    pub fn test(mut self, test: TestTask) -> Self {
        self.build.tests.push(test);
        self
    }

    pub fn build(self) -> Build {
        self.build
    }
}

/// Builder for [`GeneratorTask`] descriptors.
pub struct GeneratorTaskBuilder {
    task: GeneratorTask,
}

impl GeneratorTaskBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            task: GeneratorTask {
                name: name.to_string(),
                language: String::new(),
                scripts: Vec::new(),
                parameters: Vec::new(),
            },
        }
    }

    pub fn language(mut self, language: &str) -> Self {
        self.task.language = language.to_string();
        self
    }

    pub fn script(mut self, script: &str) -> Self {
        self.task.scripts.push(script.to_string());
        self
    }

    pub fn parameter(mut self, parameter: &str) -> Self {
        self.task.parameters.push(parameter.to_string());
        self
    }

    pub fn build(self) -> GeneratorTask {
        self.task
    }
}

/// Builder for [`TestTask`] descriptors.
pub struct TestTaskBuilder {
    test: TestTask,
}

impl TestTaskBuilder {
    pub fn new(name: &str, script: &str) -> Self {
        Self {
            test: TestTask {
                name: name.to_string(),
                language: String::new(),
                script: script.to_string(),
                parameters: Vec::new(),
            },
        }
    }

    pub fn language(mut self, language: &str) -> Self {
        self.test.language = language.to_string();
        self
    }

    pub fn parameter(mut self, parameter: &str) -> Self {
        self.test.parameters.push(parameter.to_string());
        self
    }

    pub fn build(self) -> TestTask {
        self.test
    }
}
